use keytag_core::TagId;
use std::path::PathBuf;
use thiserror::Error;

/// Storage-specific error types for the keytag access terminal.
///
/// These errors represent failures reading or writing the registry document
/// and rejected registry mutations. A lookup or removal miss is not an error:
/// it is reported as `None`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The registry document is not a well-formed array of users
    #[error("Failed to decode registry document: {0}")]
    Decode(String),

    /// The registry could not be serialized
    #[error("Failed to encode registry document: {0}")]
    Encode(String),

    /// The storage mount could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A write did not complete; the previous document is still in place
    #[error("Failed to persist {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tag is already enrolled to another user
    #[error("Tag {tag_id} is already enrolled")]
    DuplicateTag { tag_id: TagId },

    /// The user name is empty
    #[error("User name must not be empty")]
    InvalidName,
}

impl StorageError {
    /// Whether this error means the registry document could not be written.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Encode(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
