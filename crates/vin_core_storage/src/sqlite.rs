//! SQLite-backed catalog store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::Row;
use tokio::sync::{OnceCell, RwLock};

use vin_core_models::{
    AttributeRef, Element, LookupTable, Pattern, PatternKeys, PatternSource, Wmi, WmiVinSchema,
};

use crate::connection::{open_catalog_pool, CatalogPool};
use crate::error::{StorageError, StorageResult};
use crate::store::CatalogStore;

/// Catalog store backed by the embedded vPIC-derived `SQLite` database.
///
/// The element table is loaded once; per-schema pattern lists are cached on
/// first access and shared between concurrent decodes. The underlying pool
/// is held for the lifetime of the store and closed on `close`.
pub struct SqliteCatalog {
    pool: CatalogPool,
    elements: OnceCell<Arc<Vec<Element>>>,
    pattern_cache: RwLock<HashMap<i64, Arc<Vec<Pattern>>>>,
}

impl SqliteCatalog {
    /// Open a catalog at the given path (read-only for file paths).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionError` when the file cannot be
    /// opened and `StorageError::CorruptCatalog` when the core tables are
    /// missing.
    pub async fn open(catalog_path: &str) -> StorageResult<Self> {
        let pool = open_catalog_pool(catalog_path).await?;
        let store = Self::from_pool(pool);
        store.probe().await?;
        Ok(store)
    }

    /// Wrap an existing pool (used by tests that seed their own tables)
    #[must_use]
    pub fn from_pool(pool: CatalogPool) -> Self {
        Self {
            pool,
            elements: OnceCell::new(),
            pattern_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Verify the core tables are present before the first decode
    async fn probe(&self) -> StorageResult<()> {
        for table in ["Wmi", "VinSchema", "Wmi_VinSchema", "Pattern", "Element"] {
            let row = sqlx::query(
                "SELECT COUNT(*) as count FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&self.pool)
            .await?;

            let count: i64 = row.try_get("count")?;
            if count == 0 {
                return Err(StorageError::CorruptCatalog(format!(
                    "Missing core table: {table}"
                )));
            }
        }
        Ok(())
    }

    async fn load_elements(&self) -> StorageResult<Arc<Vec<Element>>> {
        let rows = sqlx::query("SELECT Id, Name, LookupTable, Weight FROM Element ORDER BY Id")
            .fetch_all(&self.pool)
            .await?;

        let mut elements = Vec::with_capacity(rows.len());
        for row in rows {
            let lookup_table: Option<String> = row.try_get("LookupTable")?;
            let lookup_table = lookup_table
                .as_deref()
                .map(LookupTable::from_name)
                .transpose()?;

            elements.push(Element {
                id: row.try_get("Id")?,
                name: row.try_get("Name")?,
                lookup_table,
                weight: row.try_get("Weight")?,
            });
        }

        tracing::debug!("Loaded {} catalog elements", elements.len());
        Ok(Arc::new(elements))
    }

    async fn load_patterns(&self, schema_id: i64) -> StorageResult<Arc<Vec<Pattern>>> {
        // Attribute classification needs each element's lookup table
        let elements = self.elements().await?;
        let lookup_by_element: HashMap<i64, Option<LookupTable>> =
            elements.iter().map(|e| (e.id, e.lookup_table)).collect();

        let rows = sqlx::query(
            "SELECT Id, VinSchemaId, Keys, ElementId, AttributeId
             FROM Pattern WHERE VinSchemaId = ? ORDER BY Id",
        )
        .bind(schema_id)
        .fetch_all(&self.pool)
        .await?;

        let mut patterns = Vec::with_capacity(rows.len());
        for row in rows {
            let keys: String = row.try_get("Keys")?;
            let element_id: i64 = row.try_get("ElementId")?;
            let attribute_raw: String = row.try_get("AttributeId")?;

            let lookup_table = lookup_by_element.get(&element_id).copied().ok_or_else(|| {
                StorageError::CorruptCatalog(format!(
                    "Pattern references unknown element {element_id}"
                ))
            })?;

            patterns.push(Pattern {
                id: row.try_get("Id")?,
                vin_schema_id: row.try_get("VinSchemaId")?,
                keys: PatternKeys::new(&keys)?,
                element_id,
                attribute: AttributeRef::classify(&attribute_raw, lookup_table),
                source: PatternSource::Official,
            });
        }

        Ok(Arc::new(patterns))
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn wmis_by_code(&self, code: &str) -> StorageResult<Vec<Wmi>> {
        let rows = sqlx::query(
            "SELECT Id, Wmi, ManufacturerId, MakeId, VehicleTypeId, CountryId
             FROM Wmi WHERE Wmi = ? ORDER BY Id",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        let mut wmis = Vec::with_capacity(rows.len());
        for row in rows {
            wmis.push(Wmi {
                id: row.try_get("Id")?,
                code: row.try_get("Wmi")?,
                manufacturer_id: row.try_get("ManufacturerId")?,
                make_id: row.try_get("MakeId")?,
                vehicle_type_id: row.try_get("VehicleTypeId")?,
                country_id: row.try_get("CountryId")?,
            });
        }

        Ok(wmis)
    }

    async fn wmi_make_ids(&self, wmi_id: i64) -> StorageResult<Vec<i64>> {
        let rows = sqlx::query("SELECT MakeId FROM Wmi_Make WHERE WmiId = ? ORDER BY MakeId")
            .bind(wmi_id)
            .fetch_all(&self.pool)
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get("MakeId")?);
        }
        Ok(ids)
    }

    async fn schemas_for_wmi(&self, wmi_id: i64) -> StorageResult<Vec<WmiVinSchema>> {
        let rows = sqlx::query(
            "SELECT Id, WmiId, VinSchemaId, YearFrom, YearTo
             FROM Wmi_VinSchema WHERE WmiId = ? ORDER BY Id",
        )
        .bind(wmi_id)
        .fetch_all(&self.pool)
        .await?;

        let mut links = Vec::with_capacity(rows.len());
        for row in rows {
            links.push(WmiVinSchema {
                id: row.try_get("Id")?,
                wmi_id: row.try_get("WmiId")?,
                vin_schema_id: row.try_get("VinSchemaId")?,
                year_from: row.try_get("YearFrom")?,
                year_to: row.try_get("YearTo")?,
            });
        }
        Ok(links)
    }

    async fn schema_name(&self, schema_id: i64) -> StorageResult<Option<String>> {
        let row = sqlx::query("SELECT Name FROM VinSchema WHERE Id = ?")
            .bind(schema_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get("Name")).transpose().map_err(Into::into)
    }

    async fn patterns_for_schema(&self, schema_id: i64) -> StorageResult<Arc<Vec<Pattern>>> {
        if let Some(cached) = self.pattern_cache.read().await.get(&schema_id) {
            return Ok(Arc::clone(cached));
        }

        let patterns = self.load_patterns(schema_id).await?;

        // Concurrent decodes may race to populate; first writer wins and the
        // loser's identical list is dropped.
        let mut cache = self.pattern_cache.write().await;
        let entry = cache.entry(schema_id).or_insert_with(|| Arc::clone(&patterns));
        Ok(Arc::clone(entry))
    }

    async fn elements(&self) -> StorageResult<Arc<Vec<Element>>> {
        let elements = self
            .elements
            .get_or_try_init(|| self.load_elements())
            .await?;
        Ok(Arc::clone(elements))
    }

    async fn lookup_name(&self, table: LookupTable, id: i64) -> StorageResult<Option<String>> {
        // Table names come from the closed enum, never from catalog data
        let query = format!("SELECT Name FROM {} WHERE Id = ?", table.as_str());
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        row.map(|r| r.try_get("Name")).transpose().map_err(Into::into)
    }

    async fn lookup_id_by_name(
        &self,
        table: LookupTable,
        name: &str,
    ) -> StorageResult<Option<i64>> {
        let query = format!("SELECT Id FROM {} WHERE Name = ?", table.as_str());
        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get("Id")).transpose().map_err(Into::into)
    }

    async fn model_in_make(&self, make_id: i64, model_id: i64) -> StorageResult<bool> {
        let row = sqlx::query("SELECT 1 FROM Make_Model WHERE MakeId = ? AND ModelId = ? LIMIT 1")
            .bind(make_id)
            .bind(model_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn close(&self) {
        tracing::info!("Closing catalog pool");
        self.pool.close().await;
    }
}
