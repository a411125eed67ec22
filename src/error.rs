//! Error types for the document store and its storage backends.

use thiserror::Error;

/// Failure reported by a [`Storage`](crate::store::Storage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Conditions surfaced by [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation referenced a document id absent from the collection.
    #[error("no document with id {0}")]
    NotFound(String),
    /// Attempt to activate an id that is not in the collection.
    #[error("cannot activate unknown document {0}")]
    InvalidReference(String),
    /// An import source could not be decoded as text.
    #[error("could not read import source: {0}")]
    ReadError(String),
    /// The persisted snapshot could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_maps_to_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: StoreError = StorageError::from(io).into();
        assert!(matches!(err, StoreError::StorageUnavailable(ref msg) if msg.contains("read-only")));
    }

    #[test]
    fn test_error_messages_name_the_id() {
        let err = StoreError::InvalidReference("42".to_string());
        assert_eq!(err.to_string(), "cannot activate unknown document 42");
    }
}
