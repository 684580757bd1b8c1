//! Schema selection
//!
//! Filters the VIN schemas linked to a WMI down to those active for the
//! resolved model year and loads their pattern lists.

use std::collections::HashSet;
use std::sync::Arc;

use vin_core_models::Pattern;
use vin_core_storage::{CatalogStore, StorageResult};

/// One selected schema with its patterns
#[derive(Debug, Clone)]
pub struct SchemaPatterns {
    pub schema_id: i64,
    pub name: String,
    pub patterns: Arc<Vec<Pattern>>,
}

/// Select the schemas applicable to `(wmi_id, model_year)`.
///
/// Overlapping year ranges are permitted and all selected; an unknown year
/// selects every schema linked to the WMI. Pattern lists come from the
/// store's per-schema cache.
///
/// # Errors
///
/// Propagates catalog query failures.
pub async fn select(
    store: &dyn CatalogStore,
    wmi_id: i64,
    model_year: Option<i32>,
) -> StorageResult<Vec<SchemaPatterns>> {
    let links = store.schemas_for_wmi(wmi_id).await?;

    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for link in links {
        let active = model_year.map_or(true, |year| {
            link.year_from <= year && year <= link.year_to.unwrap_or(i32::MAX)
        });
        if !active || !seen.insert(link.vin_schema_id) {
            continue;
        }

        let name = store
            .schema_name(link.vin_schema_id)
            .await?
            .unwrap_or_else(|| format!("schema {}", link.vin_schema_id));
        let patterns = store.patterns_for_schema(link.vin_schema_id).await?;
        selected.push(SchemaPatterns {
            schema_id: link.vin_schema_id,
            name,
            patterns,
        });
    }

    tracing::debug!(
        wmi_id,
        year = ?model_year,
        schemas = selected.len(),
        "Selected schemas"
    );

    Ok(selected)
}
