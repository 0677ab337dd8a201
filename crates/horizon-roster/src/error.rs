//! Error types for the roster.

use std::path::PathBuf;

use crate::model::FieldId;

/// Result type alias for roster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or mutating the roster.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field's raw text could not be parsed into its semantic type.
    #[error("Invalid value '{value}' for {}", .field.label())]
    InvalidFieldValue { field: FieldId, value: String },

    /// An index was stale or otherwise outside `[0, count)`.
    #[error("Index {index} is out of range for {count} records")]
    IndexOutOfRange { index: usize, count: usize },

    /// An inclusive range whose first index is past its last.
    #[error("Invalid range {first}..={last}")]
    InvalidRange { first: usize, last: usize },

    /// A widget name that does not map to any field.
    #[error("Unknown field name '{0}'")]
    UnknownField(String),

    /// Configuration could not be parsed or serialized.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration file I/O error.
    #[error("Failed to access configuration '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an invalid field value error.
    pub fn invalid_field_value(field: FieldId, value: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field,
            value: value.into(),
        }
    }

    /// Create an index error.
    pub fn index_out_of_range(index: usize, count: usize) -> Self {
        Self::IndexOutOfRange { index, count }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors caused by racing a stale index.
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. })
    }
}
