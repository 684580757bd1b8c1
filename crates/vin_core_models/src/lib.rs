//! VIN Core Models
//!
//! This crate contains shared types and data structures used throughout
//! the `VinScope` decoder, including catalog entities, decode results,
//! decode options, and structured error records.
//!
//! This crate performs no I/O and serves as the foundation for the
//! storage and domain crates.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

pub mod catalog;
pub mod errors;
pub mod options;
pub mod result;

// Re-export commonly used types
pub use catalog::{
    element, AttributeRef, Element, LookupTable, Pattern, PatternKeys, PatternSource, VinSchema,
    Wmi, WmiVinSchema,
};
pub use errors::{DecodeError, ErrorCategory, ErrorCode, ModelError, ModelResult, Severity};
pub use options::{DecodeOptions, DecoderConfig};
pub use result::{
    CheckDigitComponent, Components, DecodeResult, EngineComponent, ModelYearComponent,
    PatternMatch, PlantComponent, ResultMetadata, StageTiming, VehicleComponent, WmiComponent,
    YearSource,
};
