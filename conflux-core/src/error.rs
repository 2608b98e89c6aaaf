//! Error types for CONFLUX operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key encoding errors.
///
/// These are programmer errors: an argument tuple that cannot be turned into
/// a stable key is fatal to the call and is never written into a cache entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Argument nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },

    #[error("Argument cannot be serialized: {reason}")]
    Unserializable { reason: String },
}

/// Validation errors.
///
/// Raised synchronously, before key encoding, state mutation, or any network
/// call. Never cached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Extra detail carried by a transport error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    /// HTTP status of the failed response, when one was received.
    pub status: Option<u16>,
    /// Machine-readable reason string from the error body, when present.
    pub reason: Option<String>,
}

/// Structured failure of one external call.
///
/// Every raw transport failure (connect refusal, timeout, non-2xx status,
/// undecodable body) is translated into this shape before reaching callers;
/// callers never see transport-specific error objects. A transport error is
/// the terminal state cached for its key until an explicit reset.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct TransportError {
    pub code: String,
    pub message: String,
    pub data: ErrorData,
}

impl TransportError {
    /// A response arrived with a non-2xx status.
    pub fn http_status(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: ErrorData {
                status: Some(status),
                reason: None,
            },
        }
    }

    /// The request never produced a response (refused, reset, timed out).
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self {
            code: "request_failed".to_string(),
            message: message.into(),
            data: ErrorData::default(),
        }
    }

    /// A 2xx response whose body could not be decoded as expected.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            code: "invalid_response".to_string(),
            message: message.into(),
            data: ErrorData::default(),
        }
    }

    /// An internal failure inside the transport implementation.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "internal_error".to_string(),
            message: message.into(),
            data: ErrorData::default(),
        }
    }

    /// Attach a machine-readable reason string.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.data.reason = Some(reason.into());
        self
    }
}

/// Engine-internal errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Master error type for all CONFLUX errors.
#[derive(Debug, Clone, Error)]
pub enum ConfluxError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for CONFLUX operations.
pub type ConfluxResult<T> = Result<T, ConfluxError>;

// =============================================================================
// TESTS
// =============================================================================
