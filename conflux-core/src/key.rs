//! Resolution keys: stable identity for argument tuples.
//!
//! Deduplication and caching are keyed by the arguments of a read operation.
//! Two calls whose argument tuples are deeply equal must map to the same key
//! even when the values are distinct instances in memory. The key is the
//! canonical JSON form of the tuple: object keys sorted lexicographically at
//! every depth (mappings are unordered), array order preserved (sequences are
//! ordered).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::EncodingError;

/// Raw representation of a single call argument.
///
/// Primitives, plain mappings, and ordered sequences of such. Functions,
/// cyclic structures, and live handles have no `Value` representation and
/// are rejected at the serialization boundary.
pub type ArgValue = Value;

/// Maximum nesting depth accepted by the encoder.
///
/// Arguments to read operations are flat in practice (IDs, URLs, small
/// parameter maps); anything deeper than this is treated as a cyclic
/// structure that escaped detection.
pub const MAX_KEY_DEPTH: usize = 32;

/// Normalized identity derived from call arguments.
///
/// Holds the canonical text form of the argument tuple. Equality, hashing,
/// and ordering are all on that form, so structural equality of arguments
/// implies key equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionKey {
    canonical: String,
}

impl ResolutionKey {
    /// Build a key from any serializable argument bundle.
    ///
    /// Convenience over [`encode_args`] for operations whose arguments are
    /// already a struct or tuple.
    pub fn for_args<T: Serialize>(args: &T) -> Result<Self, EncodingError> {
        let value = serde_json::to_value(args).map_err(|e| EncodingError::Unserializable {
            reason: e.to_string(),
        })?;
        encode_args(std::slice::from_ref(&value))
    }

    /// The canonical text form of the argument tuple.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// SHA-256 digest of the canonical form, hex-encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// First 8 hex characters of the digest, for log lines.
    pub fn short_digest(&self) -> String {
        let mut digest = self.digest();
        digest.truncate(8);
        digest
    }
}

impl std::fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Encode an argument tuple into a [`ResolutionKey`].
///
/// Deeply equal tuples produce identical keys: object key order is
/// normalized, array order is significant. Fails with [`EncodingError`] if
/// any argument nests beyond [`MAX_KEY_DEPTH`] or cannot be serialized.
/// No side effects.
pub fn encode_args(args: &[ArgValue]) -> Result<ResolutionKey, EncodingError> {
    let mut canonical_args = Vec::with_capacity(args.len());
    for arg in args {
        canonical_args.push(canonicalize(arg, 0)?);
    }

    let canonical = serde_json::to_string(&Value::Array(canonical_args)).map_err(|e| {
        EncodingError::Unserializable {
            reason: e.to_string(),
        }
    })?;

    Ok(ResolutionKey { canonical })
}

/// Rebuild a value with object keys sorted at every depth.
///
/// Sorting is explicit rather than relying on the map implementation behind
/// `serde_json::Map`, which changes with the `preserve_order` feature. Depth
/// is checked on the way down; the limit doubles as the guard against cyclic
/// inputs, which cannot be represented in `Value` but could be approximated
/// by pathological nesting.
fn canonicalize(value: &Value, depth: usize) -> Result<Value, EncodingError> {
    if depth > MAX_KEY_DEPTH {
        return Err(EncodingError::DepthExceeded { max: MAX_KEY_DEPTH });
    }

    match value {
        Value::Object(map) => {
            let mut pairs: Vec<(&String, &Value)> = map.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = serde_json::Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                sorted.insert(k.clone(), canonicalize(v, depth + 1)?);
            }
            Ok(Value::Object(sorted))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(canonicalize(item, depth + 1)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deeply_equal_args_same_key() {
        let a = [json!({ "accountID": "123", "useCache": false })];
        let b = [json!({ "accountID": "123", "useCache": false })];
        assert_eq!(encode_args(&a).expect("encode"), encode_args(&b).expect("encode"));
    }

    #[test]
    fn test_object_key_order_is_normalized() {
        // Same mapping, different insertion order.
        let mut first = serde_json::Map::new();
        first.insert("b".to_string(), json!(2));
        first.insert("a".to_string(), json!(1));

        let mut second = serde_json::Map::new();
        second.insert("a".to_string(), json!(1));
        second.insert("b".to_string(), json!(2));

        let key_a = encode_args(&[Value::Object(first)]).expect("encode");
        let key_b = encode_args(&[Value::Object(second)]).expect("encode");
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_nested_object_key_order_is_normalized() {
        let mut inner_a = serde_json::Map::new();
        inner_a.insert("y".to_string(), json!("v"));
        inner_a.insert("x".to_string(), json!("u"));

        let mut inner_b = serde_json::Map::new();
        inner_b.insert("x".to_string(), json!("u"));
        inner_b.insert("y".to_string(), json!("v"));

        let key_a = encode_args(&[json!({ "outer": Value::Object(inner_a) })]).expect("encode");
        let key_b = encode_args(&[json!({ "outer": Value::Object(inner_b) })]).expect("encode");
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_array_order_is_significant() {
        let key_a = encode_args(&[json!(["1", "2"])]).expect("encode");
        let key_b = encode_args(&[json!(["2", "1"])]).expect("encode");
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_different_args_different_keys() {
        let key_a = encode_args(&[json!("https://example.com")]).expect("encode");
        let key_b = encode_args(&[json!("https://example.org")]).expect("encode");
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_argument_count_is_significant() {
        let key_a = encode_args(&[json!("123")]).expect("encode");
        let key_b = encode_args(&[json!("123"), json!("UA-123-1")]).expect("encode");
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_depth_exceeded() {
        let mut value = json!("leaf");
        for _ in 0..(MAX_KEY_DEPTH + 1) {
            value = json!([value]);
        }
        let err = encode_args(&[value]).expect_err("should exceed depth");
        assert_eq!(err, EncodingError::DepthExceeded { max: MAX_KEY_DEPTH });
    }

    #[test]
    fn test_depth_at_limit_is_accepted() {
        let mut value = json!("leaf");
        for _ in 0..MAX_KEY_DEPTH {
            value = json!([value]);
        }
        assert!(encode_args(&[value]).is_ok());
    }

    #[test]
    fn test_for_args_matches_encode_args() {
        let from_struct = ResolutionKey::for_args(&serde_json::json!({ "accountID": "123" }))
            .expect("for_args");
        let from_slice = encode_args(&[json!({ "accountID": "123" })]).expect("encode");
        assert_eq!(from_struct, from_slice);
    }

    #[test]
    fn test_for_args_rejects_non_string_map_keys() {
        let mut args = std::collections::HashMap::new();
        args.insert((1, 2), "value");
        let err = ResolutionKey::for_args(&args).expect_err("tuple keys are unserializable");
        assert!(matches!(err, EncodingError::Unserializable { .. }));
    }

    #[test]
    fn test_digest_is_stable_and_short_digest_prefixes() {
        let key = encode_args(&[json!("https://example.com")]).expect("encode");
        let digest = key.digest();
        assert_eq!(digest.len(), 64);
        assert_eq!(key.digest(), digest);
        assert!(digest.starts_with(&key.short_digest()));
        assert_eq!(key.short_digest().len(), 8);
    }

    #[test]
    fn test_display_shows_canonical_form() {
        let key = encode_args(&[json!("abc")]).expect("encode");
        assert_eq!(format!("{}", key), r#"["abc"]"#);
    }
}
