//! Pattern matching and scoring
//!
//! Matches VDS positions 4-9 against the selected schemas' wildcard
//! patterns, ranks the candidates per element, resolves attribute ids
//! through the lookup dictionaries, and computes confidences.
//!
//! Ranking order per element: element weight, then schema coherence (how
//! many patterns the candidate's schema matches against this VIN), then
//! specificity, then provenance preference, then pattern id. Coherence is
//! what keeps an F-150 from being read as an F-550: both schemas carry an
//! equally specific model pattern, but the F-150 schema matches more of
//! the VIN.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use vin_core_models::{
    AttributeRef, DecodeError, Element, ErrorCode, LookupTable, Pattern, PatternMatch,
    PatternSource,
};
use vin_core_storage::{CatalogStore, StorageResult};

use crate::schema::SchemaPatterns;

/// A scored candidate or winner, with provenance
#[derive(Debug, Clone)]
pub struct ResolvedAttribute {
    pub element_id: i64,
    pub element_name: String,
    pub weight: i32,
    pub value: String,
    pub confidence: f64,
    pub schema_id: i64,
    pub schema_name: String,
    pub keys: String,
    pub specificity: u8,
    pub source: PatternSource,
    pub pattern_id: i64,
}

impl ResolvedAttribute {
    /// Wire representation
    #[must_use]
    pub fn to_match(&self) -> PatternMatch {
        PatternMatch {
            element: self.element_name.clone(),
            value: self.value.clone(),
            confidence: self.confidence,
            vin_schema_id: self.schema_id,
            schema_name: self.schema_name.clone(),
            keys: self.keys.clone(),
            specificity: self.specificity,
            source: self.source,
        }
    }
}

/// The matcher's output: winners, the full candidate field, and warnings
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Top-ranked candidate per element, ordered by weight
    pub selected: Vec<ResolvedAttribute>,
    /// Every candidate including losers, globally ranked
    pub candidates: Vec<ResolvedAttribute>,
    pub warnings: Vec<DecodeError>,
    /// Highest number of patterns any selected schema matched
    pub best_coherence: usize,
}

impl MatchOutcome {
    /// Value of the winning attribute for an element name
    #[must_use]
    pub fn value_of(&self, element_name: &str) -> Option<&str> {
        self.selected
            .iter()
            .find(|a| a.element_name == element_name)
            .map(|a| a.value.as_str())
    }
}

struct Candidate<'a> {
    pattern: &'a Pattern,
    element: &'a Element,
    schema: &'a SchemaPatterns,
    coherence: usize,
}

impl Candidate<'_> {
    fn specificity(&self) -> u8 {
        self.pattern.keys.specificity()
    }
}

/// Provenance preference: 0 ranks before 1
const fn source_rank(source: PatternSource, prefer_community: bool) -> u8 {
    match (source, prefer_community) {
        (PatternSource::Official, false) | (PatternSource::Community, true) => 0,
        _ => 1,
    }
}

/// The ranking order; `a` before `b` means `a` wins
fn rank(a: &Candidate<'_>, b: &Candidate<'_>, prefer_community: bool) -> Ordering {
    b.element
        .weight
        .cmp(&a.element.weight)
        .then(b.coherence.cmp(&a.coherence))
        .then(b.specificity().cmp(&a.specificity()))
        .then(
            source_rank(a.pattern.source, prefer_community)
                .cmp(&source_rank(b.pattern.source, prefer_community)),
        )
        .then(a.pattern.id.cmp(&b.pattern.id))
}

fn confidence(weight: i32, specificity: u8, coherence: usize, best_coherence: usize) -> f64 {
    let weight_factor = (f64::from(weight) / 100.0).clamp(0.0, 1.0);
    let specificity_factor = 0.5 + 0.5 * f64::from(specificity) / 6.0;
    let coherence_factor = if best_coherence == 0 {
        0.0
    } else {
        coherence as f64 / best_coherence as f64
    };
    weight_factor * specificity_factor * coherence_factor
}

/// Raw display form of an unresolved attribute (used for the losers' view)
fn raw_value(attribute: &AttributeRef) -> String {
    match attribute {
        AttributeRef::Literal(value) => value.clone(),
        AttributeRef::Lookup(table, id) => format!("{}:{id}", table.as_str()),
    }
}

/// Match the VDS against the selected schemas and pick one winner per
/// element.
///
/// # Errors
///
/// Propagates catalog query failures from attribute resolution.
pub async fn match_and_score(
    store: &dyn CatalogStore,
    elements: &HashMap<i64, Element>,
    schemas: &[SchemaPatterns],
    vds: &str,
    make_id: Option<i64>,
    prefer_community: bool,
    confidence_threshold: Option<f64>,
) -> StorageResult<MatchOutcome> {
    let mut warnings = Vec::new();

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    let mut best_coherence = 0;
    for schema in schemas {
        let matched: Vec<&Pattern> = schema
            .patterns
            .iter()
            .filter(|p| p.keys.matches(vds))
            .collect();
        best_coherence = best_coherence.max(matched.len());

        let coherence = matched.len();
        for pattern in matched {
            let Some(element) = elements.get(&pattern.element_id) else {
                tracing::warn!(
                    pattern_id = pattern.id,
                    element_id = pattern.element_id,
                    "Pattern references unknown element; skipping"
                );
                continue;
            };
            candidates.push(Candidate {
                pattern,
                element,
                schema,
                coherence,
            });
        }
    }

    if candidates.is_empty() {
        warnings.push(DecodeError::new(
            ErrorCode::PatternNoMatch,
            "No schema pattern matched the vehicle descriptor section",
        ));
        return Ok(MatchOutcome {
            warnings,
            ..MatchOutcome::default()
        });
    }

    // Globally ranked view of everything that competed
    let mut ranked_view: Vec<&Candidate<'_>> = candidates.iter().collect();
    ranked_view.sort_by(|a, b| rank(a, b, prefer_community));
    let all: Vec<ResolvedAttribute> = ranked_view
        .into_iter()
        .map(|c| ResolvedAttribute {
            element_id: c.element.id,
            element_name: c.element.name.clone(),
            weight: c.element.weight,
            value: raw_value(&c.pattern.attribute),
            confidence: confidence(c.element.weight, c.specificity(), c.coherence, best_coherence),
            schema_id: c.schema.schema_id,
            schema_name: c.schema.name.clone(),
            keys: c.pattern.keys.as_str().to_string(),
            specificity: c.specificity(),
            source: c.pattern.source,
            pattern_id: c.pattern.id,
        })
        .collect();

    // One winner per element under the ranking order
    let mut by_element: BTreeMap<i64, Vec<Candidate<'_>>> = BTreeMap::new();
    for candidate in candidates {
        by_element.entry(candidate.element.id).or_default().push(candidate);
    }

    let mut selected = Vec::with_capacity(by_element.len());
    for (_, mut group) in by_element {
        group.sort_by(|a, b| rank(a, b, prefer_community));
        let winner = &group[0];

        let value = resolve_value(store, &winner.pattern.attribute, make_id, &mut warnings).await?;
        let score = confidence(
            winner.element.weight,
            winner.specificity(),
            winner.coherence,
            best_coherence,
        );
        if confidence_threshold.is_some_and(|threshold| score < threshold) {
            continue;
        }

        selected.push(ResolvedAttribute {
            element_id: winner.element.id,
            element_name: winner.element.name.clone(),
            weight: winner.element.weight,
            value,
            confidence: score,
            schema_id: winner.schema.schema_id,
            schema_name: winner.schema.name.clone(),
            keys: winner.pattern.keys.as_str().to_string(),
            specificity: winner.specificity(),
            source: winner.pattern.source,
            pattern_id: winner.pattern.id,
        });
    }

    // Well-known attributes first in the output
    selected.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.element_id.cmp(&b.element_id)));

    Ok(MatchOutcome {
        selected,
        candidates: all,
        warnings,
        best_coherence,
    })
}

/// Resolve a winner's attribute reference to a display value
async fn resolve_value(
    store: &dyn CatalogStore,
    attribute: &AttributeRef,
    make_id: Option<i64>,
    warnings: &mut Vec<DecodeError>,
) -> StorageResult<String> {
    match attribute {
        AttributeRef::Literal(value) => Ok(value.clone()),
        AttributeRef::Lookup(LookupTable::Model, model_id) => {
            let name = store.lookup_name(LookupTable::Model, *model_id).await?;
            let Some(name) = name else {
                warnings.push(DecodeError::new(
                    ErrorCode::LookupMiss,
                    format!("No Model row with id {model_id}"),
                ));
                return Ok(model_id.to_string());
            };

            // Model names are make-scoped; a model outside the resolved
            // make still resolves globally but is flagged.
            if let Some(make_id) = make_id {
                if !store.model_in_make(make_id, *model_id).await? {
                    warnings.push(DecodeError::new(
                        ErrorCode::ModelMakeMismatch,
                        format!("Model '{name}' is not registered under the resolved make"),
                    ));
                }
            }
            Ok(name)
        }
        AttributeRef::Lookup(table, id) => {
            match store.lookup_name(*table, *id).await? {
                Some(name) => Ok(name),
                None => {
                    warnings.push(DecodeError::new(
                        ErrorCode::LookupMiss,
                        format!("No {} row with id {id}", table.as_str()),
                    ));
                    Ok(id.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use vin_core_storage::{CatalogStore, MemoryCatalog, MemoryCatalogBuilder};

    /// Two schemas on one WMI: the F-550 schema carries the lower pattern
    /// ids, so only coherence can save the F-150.
    fn truck_catalog() -> (MemoryCatalog, i64, Option<i64>) {
        let mut builder = MemoryCatalogBuilder::new();
        let model_el = builder.element("Model", Some(LookupTable::Model), 99);
        let body_el = builder.element("Body Class", Some(LookupTable::BodyStyle), 80);
        let series_el = builder.element("Series", None, 75);

        let manufacturer = builder.lookup_row(LookupTable::Manufacturer, "Ford Motor Company");
        let ford = builder.lookup_row(LookupTable::Make, "Ford");
        let f150 = builder.lookup_row(LookupTable::Model, "F-150");
        let f550 = builder.lookup_row(LookupTable::Model, "F-550");
        let pickup = builder.lookup_row(LookupTable::BodyStyle, "Pickup");
        builder.link_make_model(ford, f150);
        builder.link_make_model(ford, f550);

        let wmi = builder.wmi("1FT", manufacturer, Some(ford), None, None);

        let f550_schema = builder.schema("F-550 Super Duty", "1FT");
        builder.link_wmi_schema(wmi, f550_schema, 2021, None);
        builder
            .pattern(f550_schema, "FW****", model_el, &f550.to_string(), PatternSource::Official)
            .expect("pattern");
        builder
            .pattern(f550_schema, "F*****", body_el, &pickup.to_string(), PatternSource::Official)
            .expect("pattern");

        let f150_schema = builder.schema("F-150", "1FT");
        builder.link_wmi_schema(wmi, f150_schema, 2021, None);
        builder
            .pattern(f150_schema, "FW****", model_el, &f150.to_string(), PatternSource::Official)
            .expect("pattern");
        builder
            .pattern(f150_schema, "FW****", body_el, &pickup.to_string(), PatternSource::Official)
            .expect("pattern");
        builder
            .pattern(f150_schema, "FW5***", series_el, "XLT", PatternSource::Official)
            .expect("pattern");

        (builder.build(), wmi, Some(ford))
    }

    async fn run_matcher(
        catalog: &MemoryCatalog,
        wmi: i64,
        make_id: Option<i64>,
        vds: &str,
    ) -> MatchOutcome {
        let elements = catalog.elements().await.expect("elements");
        let elements: HashMap<i64, Element> =
            elements.iter().map(|e| (e.id, e.clone())).collect();
        let schemas = schema::select(catalog, wmi, Some(2024)).await.expect("select");
        match_and_score(catalog, &elements, &schemas, vds, make_id, false, None)
            .await
            .expect("match")
    }

    #[tokio::test]
    async fn test_coherence_tiebreak_prefers_denser_schema() {
        let (catalog, wmi, ford) = truck_catalog();
        let outcome = run_matcher(&catalog, wmi, ford, "FW5L86").await;

        assert_eq!(outcome.value_of("Model"), Some("F-150"));
        assert_eq!(outcome.best_coherence, 3);

        let model = outcome
            .selected
            .iter()
            .find(|a| a.element_name == "Model")
            .expect("model selected");
        assert_eq!(model.schema_name, "F-150");
    }

    #[tokio::test]
    async fn test_winner_dominates_under_ranking_order() {
        let (catalog, wmi, ford) = truck_catalog();
        let outcome = run_matcher(&catalog, wmi, ford, "FW5L86").await;

        // The globally ranked view must lead with each element's winner
        for attr in &outcome.selected {
            let first = outcome
                .candidates
                .iter()
                .find(|c| c.element_id == attr.element_id)
                .expect("candidate present");
            assert_eq!(first.pattern_id, attr.pattern_id);
        }
    }

    #[tokio::test]
    async fn test_specificity_breaks_ties_within_schema() {
        let mut builder = MemoryCatalogBuilder::new();
        let fuel_el = builder.element("Fuel Type - Primary", Some(LookupTable::FuelType), 70);
        let gas = builder.lookup_row(LookupTable::FuelType, "Gasoline");
        let diesel = builder.lookup_row(LookupTable::FuelType, "Diesel");
        let manufacturer = builder.lookup_row(LookupTable::Manufacturer, "Generic");
        let wmi = builder.wmi("1GE", manufacturer, None, None, None);
        let schema_id = builder.schema("Generic", "1GE");
        builder.link_wmi_schema(wmi, schema_id, 2000, None);
        // The broad pattern has the lower id; the specific one must still win
        builder
            .pattern(schema_id, "******", fuel_el, &gas.to_string(), PatternSource::Official)
            .expect("pattern");
        builder
            .pattern(schema_id, "***D**", fuel_el, &diesel.to_string(), PatternSource::Official)
            .expect("pattern");
        let catalog = builder.build();

        let outcome = run_matcher(&catalog, wmi, None, "ABCD12").await;
        assert_eq!(outcome.value_of("Fuel Type - Primary"), Some("Diesel"));
    }

    #[tokio::test]
    async fn test_pattern_id_settles_exact_ties() {
        let mut builder = MemoryCatalogBuilder::new();
        let series_el = builder.element("Series", None, 75);
        let manufacturer = builder.lookup_row(LookupTable::Manufacturer, "Generic");
        let wmi = builder.wmi("1GE", manufacturer, None, None, None);
        let schema_id = builder.schema("Generic", "1GE");
        builder.link_wmi_schema(wmi, schema_id, 2000, None);
        let first = builder
            .pattern(schema_id, "A*****", series_el, "Base", PatternSource::Official)
            .expect("pattern");
        builder
            .pattern(schema_id, "*B****", series_el, "Sport", PatternSource::Official)
            .expect("pattern");
        let catalog = builder.build();

        let outcome = run_matcher(&catalog, wmi, None, "AB1234").await;
        let series = outcome
            .selected
            .iter()
            .find(|a| a.element_name == "Series")
            .expect("series selected");
        assert_eq!(series.pattern_id, first);
        assert_eq!(series.value, "Base");
    }

    #[tokio::test]
    async fn test_official_wins_provenance_ties_by_default() {
        let mut builder = MemoryCatalogBuilder::new();
        let series_el = builder.element("Series", None, 75);
        let manufacturer = builder.lookup_row(LookupTable::Manufacturer, "Generic");
        let wmi = builder.wmi("1GE", manufacturer, None, None, None);
        let schema_id = builder.schema("Generic", "1GE");
        builder.link_wmi_schema(wmi, schema_id, 2000, None);
        // Community row gets the smaller id; provenance must outrank it
        builder
            .pattern(schema_id, "A*****", series_el, "Community Trim", PatternSource::Community)
            .expect("pattern");
        builder
            .pattern(schema_id, "A*****", series_el, "Official Trim", PatternSource::Official)
            .expect("pattern");
        let catalog = builder.build();

        let outcome = run_matcher(&catalog, wmi, None, "AB1234").await;
        assert_eq!(outcome.value_of("Series"), Some("Official Trim"));

        // Flipping the preference flips the winner
        let elements = catalog.elements().await.expect("elements");
        let elements: HashMap<i64, Element> =
            elements.iter().map(|e| (e.id, e.clone())).collect();
        let schemas = schema::select(&catalog, wmi, Some(2024)).await.expect("select");
        let outcome = match_and_score(&catalog, &elements, &schemas, "AB1234", None, true, None)
            .await
            .expect("match");
        assert_eq!(outcome.value_of("Series"), Some("Community Trim"));
    }

    #[tokio::test]
    async fn test_lookup_miss_returns_literal_id() {
        let mut builder = MemoryCatalogBuilder::new();
        let body_el = builder.element("Body Class", Some(LookupTable::BodyStyle), 80);
        let manufacturer = builder.lookup_row(LookupTable::Manufacturer, "Generic");
        let wmi = builder.wmi("1GE", manufacturer, None, None, None);
        let schema_id = builder.schema("Generic", "1GE");
        builder.link_wmi_schema(wmi, schema_id, 2000, None);
        builder
            .pattern(schema_id, "A*****", body_el, "424242", PatternSource::Official)
            .expect("pattern");
        let catalog = builder.build();

        let outcome = run_matcher(&catalog, wmi, None, "AB1234").await;
        assert_eq!(outcome.value_of("Body Class"), Some("424242"));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.code == ErrorCode::LookupMiss));
    }

    #[tokio::test]
    async fn test_model_outside_make_is_flagged() {
        let mut builder = MemoryCatalogBuilder::new();
        let model_el = builder.element("Model", Some(LookupTable::Model), 99);
        let ford = builder.lookup_row(LookupTable::Make, "Ford");
        let civic = builder.lookup_row(LookupTable::Model, "Civic");
        // Civic is deliberately not linked to Ford
        let manufacturer = builder.lookup_row(LookupTable::Manufacturer, "Generic");
        let wmi = builder.wmi("1GE", manufacturer, Some(ford), None, None);
        let schema_id = builder.schema("Generic", "1GE");
        builder.link_wmi_schema(wmi, schema_id, 2000, None);
        builder
            .pattern(schema_id, "A*****", model_el, &civic.to_string(), PatternSource::Official)
            .expect("pattern");
        let catalog = builder.build();

        let outcome = run_matcher(&catalog, wmi, Some(ford), "AB1234").await;
        assert_eq!(outcome.value_of("Model"), Some("Civic"));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.code == ErrorCode::ModelMakeMismatch));
    }

    #[tokio::test]
    async fn test_no_match_emits_warning() {
        let (catalog, wmi, ford) = truck_catalog();
        let outcome = run_matcher(&catalog, wmi, ford, "ZZZZZZ").await;
        assert!(outcome.selected.is_empty());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.code == ErrorCode::PatternNoMatch));
    }

    #[tokio::test]
    async fn test_confidence_threshold_filters_weak_attributes() {
        let (catalog, wmi, ford) = truck_catalog();
        let elements = catalog.elements().await.expect("elements");
        let elements: HashMap<i64, Element> =
            elements.iter().map(|e| (e.id, e.clone())).collect();
        let schemas = schema::select(&catalog, wmi, Some(2024)).await.expect("select");

        let unfiltered =
            match_and_score(&catalog, &elements, &schemas, "FW5L86", ford, false, None)
                .await
                .expect("match");
        let filtered =
            match_and_score(&catalog, &elements, &schemas, "FW5L86", ford, false, Some(0.99))
                .await
                .expect("match");
        assert!(filtered.selected.len() < unfiltered.selected.len());
    }

    #[tokio::test]
    async fn test_confidence_is_monotonic_in_specificity() {
        assert!(confidence(99, 4, 3, 3) > confidence(99, 2, 3, 3));
        assert!(confidence(99, 2, 3, 3) > confidence(99, 2, 1, 3));
        assert!(confidence(99, 6, 3, 3) <= 1.0);
        assert!((confidence(99, 0, 0, 0)).abs() < f64::EPSILON);
    }
}
