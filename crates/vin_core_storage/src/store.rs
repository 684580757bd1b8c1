//! The read-only catalog capability
//!
//! The decoding core sees only this trait. Implementations may be backed by
//! an embedded `SQLite` file, an in-memory fixture, or a layered union of
//! both; all of them must be safe for concurrent readers with no writer.

use std::sync::Arc;

use async_trait::async_trait;
use vin_core_models::{Element, LookupTable, Pattern, Wmi, WmiVinSchema};

use crate::error::StorageResult;

/// Read-only query capability over the catalog tables
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All WMI rows sharing the given code (a code may be shared across
    /// brands)
    async fn wmis_by_code(&self, code: &str) -> StorageResult<Vec<Wmi>>;

    /// Make ids linked to a WMI through the `Wmi_Make` join table
    async fn wmi_make_ids(&self, wmi_id: i64) -> StorageResult<Vec<i64>>;

    /// Year-ranged schema links for a WMI
    async fn schemas_for_wmi(&self, wmi_id: i64) -> StorageResult<Vec<WmiVinSchema>>;

    /// Name of a VIN schema
    async fn schema_name(&self, schema_id: i64) -> StorageResult<Option<String>>;

    /// Patterns of a schema, cached per schema id for the life of the store
    async fn patterns_for_schema(&self, schema_id: i64) -> StorageResult<Arc<Vec<Pattern>>>;

    /// The full element table
    async fn elements(&self) -> StorageResult<Arc<Vec<Element>>>;

    /// Resolve an id to its name in the given dictionary
    async fn lookup_name(&self, table: LookupTable, id: i64) -> StorageResult<Option<String>>;

    /// Resolve a name to its id in the given dictionary (exact match)
    async fn lookup_id_by_name(
        &self,
        table: LookupTable,
        name: &str,
    ) -> StorageResult<Option<i64>>;

    /// Whether the model belongs to the make per the `Make_Model` join
    async fn model_in_make(&self, make_id: i64, model_id: i64) -> StorageResult<bool>;

    /// Release any held resources; further queries may fail
    async fn close(&self) {}
}
