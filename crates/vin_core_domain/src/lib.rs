//! VIN Core Domain
//!
//! This crate contains the decoding core of `VinScope`: structural
//! validation and check-digit verification, WMI resolution, model-year
//! resolution, schema selection, the pattern matcher and scorer, and the
//! result assembler, fronted by the `Decoder` API.
//!
//! The core never mutates shared state during a decode; all catalog access
//! goes through the read-only `CatalogStore` capability.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

pub mod assembler;
pub mod decoder;
pub mod matcher;
pub mod model_year;
pub mod schema;
pub mod validator;
pub mod wmi;

// Re-export the public decoding surface
pub use decoder::{CatalogSource, Decoder, DecoderError};
pub use matcher::{MatchOutcome, ResolvedAttribute};
pub use schema::SchemaPatterns;
pub use wmi::ResolvedWmi;

// Re-export shared model types for convenience
pub use vin_core_models::{DecodeOptions, DecodeResult, DecoderConfig, ErrorCode};
