use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, staging, or committing price records.
#[derive(Debug, Error)]
pub enum PriceDataError {
    /// Bad caller input, e.g. an unknown shift method.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A record name that is not in the collection.
    #[error("price record not found: {0}")]
    NotFound(String),

    /// The backing document could not be read or written.
    #[error("i/o failure on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing document was readable but not a valid price table.
    #[error("malformed price document {}: {}", .path.display(), .reason)]
    Malformed { path: PathBuf, reason: String },

    /// A record's value attribute is not a number.
    #[error("value '{value}' of price record {name} is not a number")]
    NumericConversion { name: String, value: String },

    /// A snapshot report could not be rendered.
    #[error("could not serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PriceDataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PriceDataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PriceDataError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for both storage failures: unreadable/unwritable and malformed.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            PriceDataError::Io { .. } | PriceDataError::Malformed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PriceDataError>;
