//! Community overlay composition
//!
//! Overlay documents carry additional WMIs, schemas, and patterns with
//! foreign keys expressed by name. Composition resolves those names against
//! the base catalog at load time; names the base does not know are
//! allocated ids in a reserved per-layer band, so the base catalog is never
//! mutated and layers never collide. The decoder then queries one
//! `LayeredCatalog` union view.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use vin_core_models::{
    AttributeRef, Element, LookupTable, Pattern, PatternSource, Wmi, WmiVinSchema,
};

use crate::error::{StorageError, StorageResult};
use crate::memory::{MemoryCatalog, MemoryCatalogBuilder};
use crate::store::CatalogStore;

/// Ids allocated for overlay-only names start at `layer_index * OVERLAY_ID_BASE`
pub const OVERLAY_ID_BASE: i64 = 1_000_000;

/// A community overlay document (YAML on disk)
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wmis: Vec<OverlayWmi>,
    #[serde(default)]
    pub schemas: Vec<OverlaySchema>,
}

/// An overlay WMI row with name-valued foreign keys
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayWmi {
    pub code: String,
    pub manufacturer: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
}

/// An overlay schema: patterns for one WMI and year range
#[derive(Debug, Clone, Deserialize)]
pub struct OverlaySchema {
    pub name: String,
    pub wmi: String,
    pub year_from: i32,
    #[serde(default)]
    pub year_to: Option<i32>,
    pub patterns: Vec<OverlayPattern>,
}

/// One overlay pattern; `element` and lookup values are names
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayPattern {
    pub keys: String,
    pub element: String,
    pub value: String,
}

/// Read and parse an overlay document.
///
/// # Errors
///
/// Returns `StorageError::ConfigurationError` if the file cannot be read
/// and `StorageError::SerializationError` for malformed YAML.
pub fn load_overlay_file(path: &Path) -> StorageResult<OverlayDocument> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        StorageError::ConfigurationError(format!("Failed to read overlay {}: {e}", path.display()))
    })?;
    let doc: OverlayDocument = serde_yaml::from_str(&raw)?;
    Ok(doc)
}

/// Compose overlay documents on top of a base catalog.
///
/// # Errors
///
/// Returns `StorageError::CorruptCatalog` when an overlay references an
/// element or WMI that neither the base nor the overlay defines.
pub async fn compose(
    base: Arc<dyn CatalogStore>,
    docs: &[OverlayDocument],
) -> StorageResult<LayeredCatalog> {
    let mut layered = LayeredCatalog::new(base);
    for doc in docs {
        let layer = compose_layer(layered.base(), doc, layered.layer_count()).await?;
        tracing::info!(
            "Composed overlay layer {}",
            doc.name.as_deref().unwrap_or("(unnamed)")
        );
        layered.push(Arc::new(layer));
    }
    Ok(layered)
}

async fn compose_layer(
    base: &Arc<dyn CatalogStore>,
    doc: &OverlayDocument,
    layer_index: usize,
) -> StorageResult<MemoryCatalog> {
    let mut builder = MemoryCatalogBuilder::with_id_base(layer_index as i64 * OVERLAY_ID_BASE);

    let elements = base.elements().await?;
    let elements_by_name: HashMap<&str, &Element> =
        elements.iter().map(|e| (e.name.as_str(), e)).collect();

    // WMIs first so schemas can reference them by code
    let mut local_wmis: HashMap<String, (i64, Option<i64>)> = HashMap::new();
    for overlay_wmi in &doc.wmis {
        let manufacturer_id =
            resolve_name(base, &mut builder, LookupTable::Manufacturer, &overlay_wmi.manufacturer)
                .await?;
        let make_id = match &overlay_wmi.make {
            Some(make) => Some(resolve_name(base, &mut builder, LookupTable::Make, make).await?),
            None => None,
        };
        let country_id = match &overlay_wmi.country {
            Some(country) => {
                Some(resolve_name(base, &mut builder, LookupTable::Country, country).await?)
            }
            None => None,
        };
        let vehicle_type_id = match &overlay_wmi.vehicle_type {
            Some(vt) => Some(resolve_name(base, &mut builder, LookupTable::VehicleType, vt).await?),
            None => None,
        };

        let wmi_id = builder.wmi(
            &overlay_wmi.code,
            manufacturer_id,
            make_id,
            vehicle_type_id,
            country_id,
        );
        if let Some(make_id) = make_id {
            builder.link_wmi_make(wmi_id, make_id);
        }
        local_wmis.insert(overlay_wmi.code.clone(), (wmi_id, make_id));
    }

    for overlay_schema in &doc.schemas {
        // The schema may extend a WMI defined by this overlay or by the base
        let (wmi_id, wmi_make_id) = match local_wmis.get(&overlay_schema.wmi) {
            Some(entry) => *entry,
            None => {
                let rows = base.wmis_by_code(&overlay_schema.wmi).await?;
                let row = rows.first().ok_or_else(|| {
                    StorageError::CorruptCatalog(format!(
                        "Overlay schema '{}' references unknown WMI {}",
                        overlay_schema.name, overlay_schema.wmi
                    ))
                })?;
                (row.id, row.make_id)
            }
        };

        let schema_id = builder.schema(&overlay_schema.name, &overlay_schema.wmi);
        builder.link_wmi_schema(
            wmi_id,
            schema_id,
            overlay_schema.year_from,
            overlay_schema.year_to,
        );

        for overlay_pattern in &overlay_schema.patterns {
            let element = elements_by_name.get(overlay_pattern.element.as_str()).ok_or_else(
                || {
                    StorageError::CorruptCatalog(format!(
                        "Overlay pattern references unknown element '{}'",
                        overlay_pattern.element
                    ))
                },
            )?;

            let attribute = match element.lookup_table {
                Some(table) => {
                    let id =
                        resolve_name(base, &mut builder, table, &overlay_pattern.value).await?;
                    if table == LookupTable::Model {
                        if let Some(make_id) = wmi_make_id {
                            builder.link_make_model(make_id, id);
                        }
                    }
                    AttributeRef::Lookup(table, id)
                }
                None => AttributeRef::Literal(overlay_pattern.value.clone()),
            };

            builder.pattern_raw(
                schema_id,
                &overlay_pattern.keys,
                element.id,
                attribute,
                PatternSource::Community,
            )?;
        }
    }

    Ok(builder.build())
}

/// Resolve a dictionary name against the base, allocating an overlay-local
/// id when the base does not know it
async fn resolve_name(
    base: &Arc<dyn CatalogStore>,
    builder: &mut MemoryCatalogBuilder,
    table: LookupTable,
    name: &str,
) -> StorageResult<i64> {
    if let Some(id) = base.lookup_id_by_name(table, name).await? {
        return Ok(id);
    }
    Ok(builder.lookup_row(table, name))
}

/// Union view over a base catalog and zero or more overlay layers.
///
/// Multi-row queries concatenate layers (base first); point lookups take
/// the first hit. Each layer keeps its own id space, so point lookups are
/// unambiguous.
pub struct LayeredCatalog {
    layers: Vec<Arc<dyn CatalogStore>>,
}

impl LayeredCatalog {
    /// A layered view with no overlays yet
    #[must_use]
    pub fn new(base: Arc<dyn CatalogStore>) -> Self {
        Self { layers: vec![base] }
    }

    /// The base layer
    #[must_use]
    pub fn base(&self) -> &Arc<dyn CatalogStore> {
        &self.layers[0]
    }

    /// Number of layers including the base
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Add an overlay layer
    pub fn push(&mut self, layer: Arc<dyn CatalogStore>) {
        self.layers.push(layer);
    }
}

#[async_trait]
impl CatalogStore for LayeredCatalog {
    async fn wmis_by_code(&self, code: &str) -> StorageResult<Vec<Wmi>> {
        let mut all = Vec::new();
        for layer in &self.layers {
            all.extend(layer.wmis_by_code(code).await?);
        }
        Ok(all)
    }

    async fn wmi_make_ids(&self, wmi_id: i64) -> StorageResult<Vec<i64>> {
        let mut all = Vec::new();
        for layer in &self.layers {
            all.extend(layer.wmi_make_ids(wmi_id).await?);
        }
        Ok(all)
    }

    async fn schemas_for_wmi(&self, wmi_id: i64) -> StorageResult<Vec<WmiVinSchema>> {
        let mut all = Vec::new();
        for layer in &self.layers {
            all.extend(layer.schemas_for_wmi(wmi_id).await?);
        }
        Ok(all)
    }

    async fn schema_name(&self, schema_id: i64) -> StorageResult<Option<String>> {
        for layer in &self.layers {
            if let Some(name) = layer.schema_name(schema_id).await? {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    async fn patterns_for_schema(&self, schema_id: i64) -> StorageResult<Arc<Vec<Pattern>>> {
        for layer in &self.layers {
            let patterns = layer.patterns_for_schema(schema_id).await?;
            if !patterns.is_empty() {
                return Ok(patterns);
            }
        }
        Ok(Arc::new(Vec::new()))
    }

    async fn elements(&self) -> StorageResult<Arc<Vec<Element>>> {
        // Overlay elements resolve to the base element table at compose time
        self.layers[0].elements().await
    }

    async fn lookup_name(&self, table: LookupTable, id: i64) -> StorageResult<Option<String>> {
        for layer in &self.layers {
            if let Some(name) = layer.lookup_name(table, id).await? {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    async fn lookup_id_by_name(
        &self,
        table: LookupTable,
        name: &str,
    ) -> StorageResult<Option<i64>> {
        for layer in &self.layers {
            if let Some(id) = layer.lookup_id_by_name(table, name).await? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    async fn model_in_make(&self, make_id: i64, model_id: i64) -> StorageResult<bool> {
        for layer in &self.layers {
            if layer.model_in_make(make_id, model_id).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn close(&self) {
        for layer in &self.layers {
            layer.close().await;
        }
    }
}
