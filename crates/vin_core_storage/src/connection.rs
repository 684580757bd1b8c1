//! Catalog connection management

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

use crate::error::{StorageError, StorageResult};

/// Type alias for the catalog pool
pub type CatalogPool = SqlitePool;

/// Open a connection pool for a local catalog.
///
/// Special values:
/// - `:memory:` - Creates an in-memory database with shared cache
/// - `sqlite:...` - Uses the provided `SQLite` URL directly
/// - Any other path - Opens the catalog file read-only
///
/// The decoder never writes to the catalog, so file-backed catalogs are
/// opened with `mode=ro`.
///
/// # Errors
///
/// Returns `StorageError::ConnectionError` if the catalog file does not
/// exist or the connection pool cannot be established.
pub async fn open_catalog_pool(catalog_path: &str) -> StorageResult<CatalogPool> {
    tracing::info!("Opening catalog at: {}", catalog_path);

    let catalog_url = if catalog_path == ":memory:" {
        // Shared cache so every pool connection sees the same database
        "sqlite::memory:?cache=shared".to_string()
    } else if catalog_path.starts_with("sqlite:") {
        catalog_path.to_string()
    } else {
        if !Path::new(catalog_path).exists() {
            return Err(StorageError::ConnectionError(format!(
                "Catalog file not found: {catalog_path}"
            )));
        }
        format!("sqlite:{catalog_path}?mode=ro")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5) // Reasonable for SQLite
        .acquire_timeout(Duration::from_secs(30))
        .connect(&catalog_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to open catalog: {}", e);
            StorageError::ConnectionError(e.to_string())
        })?;

    tracing::info!("Catalog connection pool established");

    Ok(pool)
}
