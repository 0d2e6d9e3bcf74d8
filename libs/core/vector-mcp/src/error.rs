//! Error handling with context pattern
//!
//! Store failures are wrapped with the operation they belong to, so the
//! message a caller sees reads "Error searching vectors: <store message>".

use domain_vector::VectorError;
use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed argument, detected before the store is touched
    #[error("Invalid argument '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    /// The store rejected or failed the call; its message is kept verbatim
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: VectorError,
    },

    #[error("Serialization error in {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    fn with_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ErrorContext<T> for std::result::Result<T, VectorError> {
    fn with_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Store {
            context: context.into(),
            source,
        })
    }
}

impl<T> ErrorContext<T> for std::result::Result<T, serde_json::Error> {
    fn with_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Serialization {
            context: context.into(),
            source,
        })
    }
}
