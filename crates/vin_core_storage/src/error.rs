//! Storage error types

use thiserror::Error;

/// Catalog storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Catalog connection error
    #[error("Catalog connection error: {0}")]
    ConnectionError(String),

    /// Catalog query error
    #[error("Catalog query error: {0}")]
    QueryError(String),

    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Catalog data failed load-time validation
    #[error("Corrupt catalog: {0}")]
    CorruptCatalog(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Convert sqlx errors to storage errors
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db_err) => Self::QueryError(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                Self::ConnectionError("Connection pool timed out".to_string())
            }
            sqlx::Error::PoolClosed => Self::ConnectionError("Connection pool closed".to_string()),
            _ => Self::QueryError(err.to_string()),
        }
    }
}

/// Convert model validation errors to storage errors.
///
/// Model-level failures at row-mapping time mean the catalog itself is bad.
impl From<vin_core_models::ModelError> for StorageError {
    fn from(err: vin_core_models::ModelError) -> Self {
        Self::CorruptCatalog(err.to_string())
    }
}

/// Convert `serde_yaml` errors to storage errors
impl From<serde_yaml::Error> for StorageError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
