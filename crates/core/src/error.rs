//! Error types for embedstore
//!
//! Every operation returns an explicit [`EmbedError`] on failure; nothing is
//! silently coerced or defaulted. Collaborator (storage) failures are carried
//! through unmodified as the boxed source of [`EmbedError::Collaborator`].

use thiserror::Error;

/// Boxed error coming from a storage collaborator
pub type CollaboratorSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the codec, distance engine, search strategies and
/// the embedding database facade
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Type name is not one of the registered element types
    #[error("Unsupported type: {name}")]
    UnsupportedType {
        /// The unrecognized type name
        name: String,
    },

    /// Value not exactly representable, or declared type conflicts with inferred type
    #[error("Type mismatch: {reason}")]
    TypeMismatch {
        /// Human-readable description of the conflict
        reason: String,
    },

    /// Vector length doesn't match the declared or query length
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Byte payload malformed for its declared type/length
    #[error("Corrupt payload: {reason}")]
    CorruptPayload {
        /// What is wrong with the payload
        reason: String,
    },

    /// Metric preconditions violated (e.g. zero-norm vector under cosine)
    #[error("Degenerate vector under {metric}: {reason}")]
    DegenerateVector {
        /// Metric name
        metric: String,
        /// Violated precondition
        reason: String,
    },

    /// Metric name is not registered
    #[error("Unsupported metric: {name}")]
    UnsupportedMetric {
        /// The unrecognized metric name
        name: String,
    },

    /// Requested id (or database file) is absent
    #[error("Not found: {id}")]
    NotFound {
        /// Identifier that was looked up
        id: String,
    },

    /// Database was already initialized with a different configuration
    #[error("Config mismatch: {field} is {existing}, requested {requested}")]
    ConfigMismatch {
        /// The immutable field
        field: String,
        /// Value stored in the database
        existing: String,
        /// Value requested by the caller
        requested: String,
    },

    /// Bulk operation exceeds the configured limit
    #[error("Limit exceeded: requested {requested}, max {max}")]
    LimitExceeded {
        /// Requested record count
        requested: usize,
        /// Configured maximum
        max: usize,
    },

    /// Caller supplied invalid arguments
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was invalid
        message: String,
    },

    /// Opaque failure surfaced from the storage layer
    #[error("Collaborator error: {0}")]
    Collaborator(#[source] CollaboratorSource),
}

impl EmbedError {
    /// Create an UnsupportedType error
    pub fn unsupported_type(name: impl Into<String>) -> Self {
        EmbedError::UnsupportedType { name: name.into() }
    }

    /// Create a TypeMismatch error
    pub fn type_mismatch(reason: impl Into<String>) -> Self {
        EmbedError::TypeMismatch {
            reason: reason.into(),
        }
    }

    /// Create a CorruptPayload error
    pub fn corrupt_payload(reason: impl Into<String>) -> Self {
        EmbedError::CorruptPayload {
            reason: reason.into(),
        }
    }

    /// Create a DegenerateVector error
    pub fn degenerate(metric: impl Into<String>, reason: impl Into<String>) -> Self {
        EmbedError::DegenerateVector {
            metric: metric.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        EmbedError::NotFound { id: id.into() }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        EmbedError::InvalidInput {
            message: message.into(),
        }
    }

    /// Wrap a storage-layer failure without altering it
    pub fn collaborator<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EmbedError::Collaborator(Box::new(source))
    }

    /// Check if this error indicates a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, EmbedError::NotFound { .. })
    }

    /// Check if this error was raised by input validation (nothing was written)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            EmbedError::UnsupportedType { .. }
                | EmbedError::TypeMismatch { .. }
                | EmbedError::DimensionMismatch { .. }
                | EmbedError::UnsupportedMetric { .. }
                | EmbedError::ConfigMismatch { .. }
                | EmbedError::LimitExceeded { .. }
                | EmbedError::InvalidInput { .. }
        )
    }

    /// Check if this error came from the storage collaborator
    pub fn is_collaborator_error(&self) -> bool {
        matches!(self, EmbedError::Collaborator(_))
    }
}

/// Result type alias for embedstore operations
pub type EmbedResult<T> = Result<T, EmbedError>;
