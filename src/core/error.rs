use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl StoreError {
    /// Whether the caller may retry the same call after re-reading state.
    ///
    /// Nothing in this crate retries on its own; this only classifies.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_) | Self::StorageUnavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(StoreError::ConcurrencyConflict("etag".into()).is_retriable());
        assert!(StoreError::StorageUnavailable("down".into()).is_retriable());
        assert!(!StoreError::NotFound("row".into()).is_retriable());
        assert!(!StoreError::DuplicateKey("row".into()).is_retriable());
    }

    #[test]
    fn test_display_messages() {
        let err = StoreError::NotFound("Entity 'p/r' in table 'people'".into());
        assert_eq!(err.to_string(), "Not found: Entity 'p/r' in table 'people'");
    }
}
