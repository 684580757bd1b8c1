//! Decode result types
//!
//! The wire shape returned by every decode: grouped components, optional
//! pattern provenance, structured errors, and metadata.

use serde::{Deserialize, Serialize};

use crate::catalog::PatternSource;
use crate::errors::DecodeError;

/// Where the resolved model year came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearSource {
    /// Decoded from positions 10 and 7
    Decoded,
    /// Supplied by the caller
    Override,
    /// Not encoded (non-US VIN) and no override supplied
    Unknown,
}

/// Core vehicle identity attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleComponent {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub series: Option<String>,
    pub body_style: Option<String>,
    pub drive_type: Option<String>,
    pub fuel_type: Option<String>,
    pub doors: Option<String>,
}

/// Resolved WMI information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmiComponent {
    pub code: String,
    pub manufacturer: Option<String>,
    pub make: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub vehicle_type: Option<String>,
}

/// Assembly plant information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantComponent {
    pub country: Option<String>,
    pub city: Option<String>,
    /// Position 11 of the VIN
    pub code: char,
}

/// Engine attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineComponent {
    pub model: Option<String>,
    pub cylinders: Option<String>,
    pub displacement: Option<String>,
    pub fuel: Option<String>,
}

/// Resolved model year with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelYearComponent {
    pub year: Option<i32>,
    pub source: YearSource,
    pub confidence: f64,
}

impl Default for ModelYearComponent {
    fn default() -> Self {
        Self {
            year: None,
            source: YearSource::Unknown,
            confidence: 0.0,
        }
    }
}

/// Check digit verification outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDigitComponent {
    pub is_valid: bool,
    pub expected: Option<char>,
    pub actual: Option<char>,
}

/// Named component groups of a decode result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub vehicle: VehicleComponent,
    pub wmi: Option<WmiComponent>,
    pub plant: Option<PlantComponent>,
    pub engine: EngineComponent,
    pub model_year: ModelYearComponent,
    pub check_digit: Option<CheckDigitComponent>,
}

/// One ranked pattern match that produced (or competed for) an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub element: String,
    pub value: String,
    pub confidence: f64,
    pub vin_schema_id: i64,
    pub schema_name: String,
    pub keys: String,
    pub specificity: u8,
    pub source: PatternSource,
}

/// Per-stage timing, attached when diagnostics are requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub micros: u64,
}

/// Decode metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub processing_time_ms: f64,
    /// Geometric mean over the core attribute confidences
    pub confidence: f64,
    /// Number of schemas selected for the resolved model year
    pub schema_count: usize,
    pub stage_timings: Option<Vec<StageTiming>>,
}

/// The complete result of one decode.
///
/// A decode always produces a result; invalid results carry at least one
/// fatal error, valid results may still carry warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub vin: String,
    pub valid: bool,
    pub components: Components,
    /// Winning pattern matches, present when pattern details were requested
    pub patterns: Option<Vec<PatternMatch>>,
    /// Every candidate including losers, present when raw data was requested
    pub raw_matches: Option<Vec<PatternMatch>>,
    pub errors: Vec<DecodeError>,
    pub metadata: Option<ResultMetadata>,
}

impl DecodeResult {
    /// An empty result shell for the given normalized VIN
    #[must_use]
    pub fn empty(vin: impl Into<String>) -> Self {
        Self {
            vin: vin.into(),
            valid: true,
            components: Components::default(),
            patterns: None,
            raw_matches: None,
            errors: Vec::new(),
            metadata: None,
        }
    }

    /// Attach an error and update validity
    pub fn push_error(&mut self, error: DecodeError) {
        if error.is_fatal() {
            self.valid = false;
        }
        self.errors.push(error);
    }

    /// Whether an error with the given code is attached
    #[must_use]
    pub fn has_error(&self, code: crate::errors::ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}
