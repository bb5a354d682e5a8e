/// Storage-specific errors
use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored JSON column could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StorageError> for tattmap_core::TattmapError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Database(db) => Self::from(db),
            StorageError::Serialization(e) => Self::Serialization(e),
            other => Self::storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tattmap_core::TattmapError;

    #[test]
    fn test_connection_error_becomes_storage_error() {
        let err: TattmapError = StorageError::Connection("refused".to_string()).into();
        assert!(matches!(err, TattmapError::Storage(ref msg) if msg.contains("refused")));
    }

    #[test]
    fn test_json_error_keeps_its_kind() {
        let json_err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let err: TattmapError = StorageError::from(json_err).into();
        assert!(matches!(err, TattmapError::Serialization(_)));
    }
}
