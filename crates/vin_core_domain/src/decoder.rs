//! The decoder front door
//!
//! Owns the catalog handle and the element table for its lifetime, and runs
//! the decode pipeline: validate, resolve WMI, resolve model year, select
//! schemas, match patterns, assemble. Any stage may attach errors; only
//! structural failure and an unknown WMI abort the pipeline.
//!
//! The decoder is immutable after construction and safe to share across
//! concurrent decodes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Datelike;
use thiserror::Error;

use vin_core_models::{
    element, DecodeError, DecodeOptions, DecodeResult, DecoderConfig, Element, ErrorCode,
    ModelYearComponent, ResultMetadata, StageTiming,
};
use vin_core_storage::{CatalogStore, SqliteCatalog};

use crate::matcher::{self, MatchOutcome};
use crate::model_year;
use crate::schema;
use crate::validator;
use crate::wmi;

/// Where the catalog comes from
pub enum CatalogSource {
    /// A local catalog file, opened read-only
    Path(PathBuf),
    /// An injected store (in-memory fixture, layered overlay view, ...)
    Store(Arc<dyn CatalogStore>),
}

impl CatalogSource {
    /// A file-backed source
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// An injected store
    #[must_use]
    pub fn store(store: Arc<dyn CatalogStore>) -> Self {
        Self::Store(store)
    }
}

/// Construction-time failures; the only error the decoder ever raises
#[derive(Debug, Error)]
pub enum DecoderError {
    /// The catalog could not be opened or failed validation
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

/// Offline VIN decoder over an immutable catalog
pub struct Decoder {
    store: Arc<dyn CatalogStore>,
    elements: HashMap<i64, Element>,
    config: DecoderConfig,
    now_year: i32,
}

impl Decoder {
    /// Open a decoder over the given catalog source.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError::CatalogUnavailable` when the catalog cannot
    /// be opened or its element table cannot be loaded.
    pub async fn open(source: CatalogSource, config: DecoderConfig) -> Result<Self, DecoderError> {
        let store: Arc<dyn CatalogStore> = match source {
            CatalogSource::Path(path) => {
                let catalog = SqliteCatalog::open(&path.to_string_lossy())
                    .await
                    .map_err(|e| DecoderError::CatalogUnavailable(e.to_string()))?;
                Arc::new(catalog)
            }
            CatalogSource::Store(store) => store,
        };

        let elements = store
            .elements()
            .await
            .map_err(|e| DecoderError::CatalogUnavailable(e.to_string()))?;
        let elements: HashMap<i64, Element> =
            elements.iter().map(|e| (e.id, e.clone())).collect();

        tracing::info!(elements = elements.len(), "Decoder ready");

        Ok(Self {
            store,
            elements,
            config,
            now_year: chrono::Utc::now().year(),
        })
    }

    /// Pin the "now" reference used by the model-year future guard
    #[must_use]
    pub const fn with_now_year(mut self, now_year: i32) -> Self {
        self.now_year = now_year;
        self
    }

    /// Decode with the configured default options
    pub async fn decode(&self, vin: &str) -> DecodeResult {
        let options = self.config.default_options.clone();
        self.decode_with(vin, &options).await
    }

    /// Decode with explicit options
    pub async fn decode_with(&self, vin: &str, options: &DecodeOptions) -> DecodeResult {
        let started = Instant::now();
        let mut clock = StageClock::new(options.include_diagnostics);

        // Stage 1: structural validation
        let normalized = match validator::validate(vin) {
            Ok(normalized) => normalized,
            Err(error) => {
                let mut result = DecodeResult::empty(validator::normalize(vin));
                result.push_error(error);
                return finalize(result, started, clock, 0.0, 0);
            }
        };
        let mut result = DecodeResult::empty(normalized.clone());

        let check_digit = validator::check_digit(&normalized);
        if !check_digit.is_valid {
            result.push_error(DecodeError::new(
                ErrorCode::InvalidCheckDigit,
                format!(
                    "Expected '{}', found '{}'",
                    check_digit.expected.unwrap_or('?'),
                    check_digit.actual.unwrap_or('?')
                ),
            ));
        }
        result.components.check_digit = Some(check_digit.clone());
        clock.mark("validate");

        // Stage 2: WMI resolution (fatal when the catalog has no row)
        let resolved_wmi = match wmi::resolve(self.store.as_ref(), &normalized).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                result.push_error(DecodeError::new(
                    ErrorCode::WmiNotFound,
                    format!("WMI '{}' is not in the catalog", &normalized[..3]),
                ));
                return finalize(result, started, clock, 0.0, 0);
            }
            Err(error) => {
                result.push_error(DecodeError::new(ErrorCode::CatalogUnavailable, error.to_string()));
                return finalize(result, started, clock, 0.0, 0);
            }
        };
        result.components.wmi = Some(resolved_wmi.to_component());
        clock.mark("wmi");

        // Stage 3: model year
        let year_resolution = model_year::resolve(&normalized, options.model_year, self.now_year);
        for warning in year_resolution.warnings {
            result.push_error(warning);
        }
        let model_year = year_resolution.component;
        result.components.model_year = model_year.clone();
        clock.mark("model_year");

        // Stage 4: schema selection
        let schemas =
            match schema::select(self.store.as_ref(), resolved_wmi.wmi.id, model_year.year).await {
                Ok(schemas) => schemas,
                Err(error) => {
                    result
                        .push_error(DecodeError::new(ErrorCode::CatalogUnavailable, error.to_string()));
                    return finalize(result, started, clock, 0.0, 0);
                }
            };
        let schema_count = schemas.len();
        clock.mark("schemas");

        // Stage 5: pattern matching and scoring
        let vds = &normalized[3..9];
        let outcome = match matcher::match_and_score(
            self.store.as_ref(),
            &self.elements,
            &schemas,
            vds,
            resolved_wmi.make_id,
            self.config.prefer_community,
            options.confidence_threshold,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                result.push_error(DecodeError::new(ErrorCode::CatalogUnavailable, error.to_string()));
                return finalize(result, started, clock, 0.0, schema_count);
            }
        };
        for warning in outcome.warnings.clone() {
            result.push_error(warning);
        }
        clock.mark("match");

        // Stage 6: assembly
        result.components = crate::assembler::assemble(
            &normalized,
            &resolved_wmi,
            model_year.clone(),
            check_digit,
            &outcome,
        );
        if options.include_pattern_details {
            result.patterns = Some(crate::assembler::winning_matches(&outcome));
        }
        if options.include_raw_data {
            result.raw_matches = Some(crate::assembler::all_matches(&outcome));
        }
        clock.mark("assemble");

        let confidence = overall_confidence(&outcome, &model_year);
        finalize(result, started, clock, confidence, schema_count)
    }

    /// Decode with a soft per-decode timeout.
    ///
    /// On expiry the pending decode is dropped between stages and a result
    /// carrying the fatal TIMEOUT error is returned instead.
    pub async fn decode_timeout(
        &self,
        vin: &str,
        options: &DecodeOptions,
        timeout: Duration,
    ) -> DecodeResult {
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.decode_with(vin, options)).await {
            Ok(result) => result,
            Err(_) => {
                let mut result = DecodeResult::empty(validator::normalize(vin));
                result.push_error(DecodeError::new(
                    ErrorCode::Timeout,
                    format!("Decode exceeded {} ms", timeout.as_millis()),
                ));
                finalize(result, started, StageClock::new(false), 0.0, 0)
            }
        }
    }

    /// Release catalog resources
    pub async fn close(&self) {
        self.store.close().await;
    }
}

/// Per-stage stopwatch, active only when diagnostics are requested
struct StageClock {
    timings: Option<Vec<StageTiming>>,
    last: Instant,
}

impl StageClock {
    fn new(enabled: bool) -> Self {
        Self {
            timings: enabled.then(Vec::new),
            last: Instant::now(),
        }
    }

    fn mark(&mut self, stage: &str) {
        if let Some(timings) = self.timings.as_mut() {
            let micros = u64::try_from(self.last.elapsed().as_micros()).unwrap_or(u64::MAX);
            timings.push(StageTiming {
                stage: stage.to_string(),
                micros,
            });
            self.last = Instant::now();
        }
    }
}

/// Geometric mean over the core attribute confidences.
///
/// The core set is Make, Model, Body Class plus the model-year confidence;
/// an unknown year therefore zeroes the overall score.
fn overall_confidence(outcome: &MatchOutcome, model_year: &ModelYearComponent) -> f64 {
    let mut factors: Vec<f64> = Vec::new();
    for name in [element::MAKE, element::MODEL, element::BODY_CLASS] {
        if let Some(attr) = outcome.selected.iter().find(|a| a.element_name == name) {
            factors.push(attr.confidence);
        }
    }
    factors.push(model_year.confidence);

    let product: f64 = factors.iter().product();
    if product <= 0.0 {
        return 0.0;
    }
    product.powf(1.0 / factors.len() as f64)
}

fn finalize(
    mut result: DecodeResult,
    started: Instant,
    clock: StageClock,
    confidence: f64,
    schema_count: usize,
) -> DecodeResult {
    result.metadata = Some(ResultMetadata {
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        confidence,
        schema_count,
        stage_timings: clock.timings,
    });
    result
}
