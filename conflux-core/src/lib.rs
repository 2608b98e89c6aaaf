//! CONFLUX Core - Keys, Errors, and the Transport Boundary
//!
//! Pure data and contracts with no engine logic. All other crates depend on
//! this. The resolution engine itself lives in `conflux-store`.

pub mod error;
pub mod key;
pub mod status;
pub mod transport;

pub use error::{
    ConfluxError, ConfluxResult, EncodingError, ErrorData, StoreError, TransportError,
    ValidationError,
};
pub use key::{encode_args, ArgValue, ResolutionKey, MAX_KEY_DEPTH};
pub use status::ResolutionStatus;
pub use transport::{Method, Payload, RequestOptions, Target, Transport, TransportRequest};
