//! In-memory catalog store
//!
//! Backs unit fixtures and composed overlay layers. Built once through
//! `MemoryCatalogBuilder`, then immutable and shareable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use vin_core_models::{
    AttributeRef, Element, LookupTable, Pattern, PatternKeys, PatternSource, VinSchema, Wmi,
    WmiVinSchema,
};

use crate::error::{StorageError, StorageResult};
use crate::store::CatalogStore;

/// Immutable in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    wmis: Vec<Wmi>,
    wmi_makes: Vec<(i64, i64)>,
    schemas: HashMap<i64, VinSchema>,
    wmi_schemas: Vec<WmiVinSchema>,
    patterns: HashMap<i64, Arc<Vec<Pattern>>>,
    elements: Arc<Vec<Element>>,
    lookups: HashMap<LookupTable, Vec<(i64, String)>>,
    make_models: HashSet<(i64, i64)>,
}

/// Builder for `MemoryCatalog`.
///
/// Ids are allocated from a configurable base so overlay layers can live in
/// their own id band without colliding with the base catalog.
#[derive(Debug)]
pub struct MemoryCatalogBuilder {
    next_id: i64,
    wmis: Vec<Wmi>,
    wmi_makes: Vec<(i64, i64)>,
    schemas: HashMap<i64, VinSchema>,
    wmi_schemas: Vec<WmiVinSchema>,
    patterns: HashMap<i64, Vec<Pattern>>,
    elements: Vec<Element>,
    lookups: HashMap<LookupTable, Vec<(i64, String)>>,
    make_models: HashSet<(i64, i64)>,
}

impl Default for MemoryCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalogBuilder {
    /// Builder with ids starting at 1
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_base(1)
    }

    /// Builder allocating ids from `base` upward
    #[must_use]
    pub fn with_id_base(base: i64) -> Self {
        Self {
            next_id: base,
            wmis: Vec::new(),
            wmi_makes: Vec::new(),
            schemas: HashMap::new(),
            wmi_schemas: Vec::new(),
            patterns: HashMap::new(),
            elements: Vec::new(),
            lookups: HashMap::new(),
            make_models: HashSet::new(),
        }
    }

    fn alloc_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register an element; returns its id
    pub fn element(&mut self, name: &str, lookup_table: Option<LookupTable>, weight: i32) -> i64 {
        let id = self.alloc_id();
        self.elements.push(Element {
            id,
            name: name.to_string(),
            lookup_table,
            weight,
        });
        id
    }

    /// Register a dictionary row; returns the existing id when the name is
    /// already present
    pub fn lookup_row(&mut self, table: LookupTable, name: &str) -> i64 {
        let rows = self.lookups.entry(table).or_default();
        if let Some((id, _)) = rows.iter().find(|(_, n)| n == name) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        rows.push((id, name.to_string()));
        id
    }

    /// Register a WMI row; returns its id
    pub fn wmi(
        &mut self,
        code: &str,
        manufacturer_id: i64,
        make_id: Option<i64>,
        vehicle_type_id: Option<i64>,
        country_id: Option<i64>,
    ) -> i64 {
        let id = self.alloc_id();
        self.wmis.push(Wmi {
            id,
            code: code.to_string(),
            manufacturer_id,
            make_id,
            vehicle_type_id,
            country_id,
        });
        id
    }

    /// Link a WMI to a make through the join table
    pub fn link_wmi_make(&mut self, wmi_id: i64, make_id: i64) {
        self.wmi_makes.push((wmi_id, make_id));
    }

    /// Register a VIN schema; returns its id
    pub fn schema(&mut self, name: &str, source_wmi: &str) -> i64 {
        let id = self.alloc_id();
        self.schemas.insert(
            id,
            VinSchema {
                id,
                name: name.to_string(),
                source_wmi: source_wmi.to_string(),
                notes: None,
            },
        );
        self.patterns.entry(id).or_default();
        id
    }

    /// Link a WMI to a schema for a year range
    pub fn link_wmi_schema(
        &mut self,
        wmi_id: i64,
        vin_schema_id: i64,
        year_from: i32,
        year_to: Option<i32>,
    ) {
        let id = self.alloc_id();
        self.wmi_schemas.push(WmiVinSchema {
            id,
            wmi_id,
            vin_schema_id,
            year_from,
            year_to,
        });
    }

    /// Register a pattern, classifying the attribute against the builder's
    /// own element table.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CorruptCatalog` for invalid keys or an
    /// unknown element id.
    pub fn pattern(
        &mut self,
        vin_schema_id: i64,
        keys: &str,
        element_id: i64,
        attribute_raw: &str,
        source: PatternSource,
    ) -> StorageResult<i64> {
        let lookup_table = self
            .elements
            .iter()
            .find(|e| e.id == element_id)
            .map(|e| e.lookup_table)
            .ok_or_else(|| {
                StorageError::CorruptCatalog(format!(
                    "Pattern references unknown element {element_id}"
                ))
            })?;

        let attribute = AttributeRef::classify(attribute_raw, lookup_table);
        self.pattern_raw(vin_schema_id, keys, element_id, attribute, source)
    }

    /// Register a pattern with a pre-resolved attribute reference.
    ///
    /// Used by the overlay composer, whose element ids belong to the base
    /// catalog rather than this builder.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CorruptCatalog` for invalid keys.
    pub fn pattern_raw(
        &mut self,
        vin_schema_id: i64,
        keys: &str,
        element_id: i64,
        attribute: AttributeRef,
        source: PatternSource,
    ) -> StorageResult<i64> {
        let keys = PatternKeys::new(keys)?;
        let id = self.alloc_id();
        self.patterns.entry(vin_schema_id).or_default().push(Pattern {
            id,
            vin_schema_id,
            keys,
            element_id,
            attribute,
            source,
        });
        Ok(id)
    }

    /// Link a model to a make through the join table
    pub fn link_make_model(&mut self, make_id: i64, model_id: i64) {
        self.make_models.insert((make_id, model_id));
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> MemoryCatalog {
        MemoryCatalog {
            wmis: self.wmis,
            wmi_makes: self.wmi_makes,
            schemas: self.schemas,
            wmi_schemas: self.wmi_schemas,
            patterns: self
                .patterns
                .into_iter()
                .map(|(k, v)| (k, Arc::new(v)))
                .collect(),
            elements: Arc::new(self.elements),
            lookups: self.lookups,
            make_models: self.make_models,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn wmis_by_code(&self, code: &str) -> StorageResult<Vec<Wmi>> {
        Ok(self
            .wmis
            .iter()
            .filter(|w| w.code == code)
            .cloned()
            .collect())
    }

    async fn wmi_make_ids(&self, wmi_id: i64) -> StorageResult<Vec<i64>> {
        Ok(self
            .wmi_makes
            .iter()
            .filter(|(w, _)| *w == wmi_id)
            .map(|(_, m)| *m)
            .collect())
    }

    async fn schemas_for_wmi(&self, wmi_id: i64) -> StorageResult<Vec<WmiVinSchema>> {
        Ok(self
            .wmi_schemas
            .iter()
            .filter(|s| s.wmi_id == wmi_id)
            .cloned()
            .collect())
    }

    async fn schema_name(&self, schema_id: i64) -> StorageResult<Option<String>> {
        Ok(self.schemas.get(&schema_id).map(|s| s.name.clone()))
    }

    async fn patterns_for_schema(&self, schema_id: i64) -> StorageResult<Arc<Vec<Pattern>>> {
        Ok(self
            .patterns
            .get(&schema_id)
            .map_or_else(|| Arc::new(Vec::new()), Arc::clone))
    }

    async fn elements(&self) -> StorageResult<Arc<Vec<Element>>> {
        Ok(Arc::clone(&self.elements))
    }

    async fn lookup_name(&self, table: LookupTable, id: i64) -> StorageResult<Option<String>> {
        Ok(self.lookups.get(&table).and_then(|rows| {
            rows.iter()
                .find(|(row_id, _)| *row_id == id)
                .map(|(_, name)| name.clone())
        }))
    }

    async fn lookup_id_by_name(
        &self,
        table: LookupTable,
        name: &str,
    ) -> StorageResult<Option<i64>> {
        Ok(self.lookups.get(&table).and_then(|rows| {
            rows.iter()
                .find(|(_, row_name)| row_name == name)
                .map(|(id, _)| *id)
        }))
    }

    async fn model_in_make(&self, make_id: i64, model_id: i64) -> StorageResult<bool> {
        Ok(self.make_models.contains(&(make_id, model_id)))
    }
}
