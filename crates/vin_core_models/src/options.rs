//! Decode and decoder configuration options

use serde::{Deserialize, Serialize};

/// Per-decode options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Explicit model year; always wins over the decoded year
    pub model_year: Option<i32>,
    /// Attach the ranked winning pattern matches
    pub include_pattern_details: bool,
    /// Attach every candidate, losers included
    pub include_raw_data: bool,
    /// Drop resolved attributes whose confidence falls below this
    pub confidence_threshold: Option<f64>,
    /// Attach per-stage timings to the metadata
    pub include_diagnostics: bool,
}

/// Decoder-level configuration, fixed at construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Options applied when `decode` is called without explicit options
    pub default_options: DecodeOptions,
    /// Prefer community patterns over official ones on same-element ties
    pub prefer_community: bool,
}
