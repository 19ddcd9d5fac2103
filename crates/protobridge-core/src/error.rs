//! Error types for codec generation.
//!
//! Generation errors are fatal for the whole output file: a file either
//! completes or aborts before any of its text is used.

use thiserror::Error;

/// Result type alias for generation operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Error type for generation operations.
///
/// Every variant names the offending field and message by fully-qualified
/// name so schema authors can locate the problem without a stack trace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// A field's declared type has no classification.
    #[error("unsupported field kind for {message}.{field}")]
    UnsupportedFieldKind { message: String, field: String },

    /// A field references a type name absent from the resolved graph.
    #[error("unresolved type reference {type_name} at {message}.{field}")]
    UnresolvedTypeRef {
        message: String,
        field: String,
        type_name: String,
    },

    /// A message flagged as a map entry lacks the synthetic key/value shape.
    #[error("malformed map entry {entry} referenced by {message}.{field}")]
    MalformedMapEntry {
        message: String,
        field: String,
        entry: String,
    },

    /// A field references a oneof index the message does not declare.
    #[error("malformed oneof reference (index {index}) at {message}.{field}")]
    MalformedOneof {
        message: String,
        field: String,
        index: usize,
    },

    /// The requested option combination has no valid representation.
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),
}
