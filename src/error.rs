use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Represents a runtime error.
#[derive(Debug, Error)]
pub enum Error {
    /// Container header or chunk structure is malformed.
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    /// A URI could not be fetched, or a referenced index is out of range.
    #[error("unresolved resource: {0}")]
    UnresolvedResource(String),

    /// A byte range exceeds its buffer, or an element index exceeds the
    /// element count.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A mutation would leave a property violating its invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A required extension has no registered handler.
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    /// Operation on a disposed property or a stale edge handle.
    #[error("operation on disposed property")]
    Disposed,

    /// A node-child edge would introduce a cycle.
    #[error("edge would introduce a cycle")]
    Cycle,

    /// A transform requires an injected codec that was not provided.
    #[error("missing encoder: {0}")]
    EncoderMissing(String),

    /// Standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base 64 decoding error.
    #[error("base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),
}
