//! Catalog entity types
//!
//! These mirror the embedded vPIC-derived table layout: WMIs, VIN schemas,
//! positional patterns, elements, and the closed set of lookup dictionaries.
//! Everything here is plain immutable data; the storage crate materializes
//! these types from SQLite rows, in-memory fixtures, or overlay documents.

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, ModelResult};

/// Canonical element names used when assembling components.
///
/// Elements are open-ended in the catalog; these are the ones the result
/// assembler groups into named components.
pub mod element {
    pub const MAKE: &str = "Make";
    pub const MODEL: &str = "Model";
    pub const SERIES: &str = "Series";
    pub const BODY_CLASS: &str = "Body Class";
    pub const DRIVE_TYPE: &str = "Drive Type";
    pub const FUEL_TYPE_PRIMARY: &str = "Fuel Type - Primary";
    pub const DOORS: &str = "Doors";
    pub const ENGINE_MODEL: &str = "Engine Model";
    pub const ENGINE_CYLINDERS: &str = "Engine Number of Cylinders";
    pub const DISPLACEMENT_L: &str = "Displacement (L)";
    pub const PLANT_COUNTRY: &str = "Plant Country";
    pub const PLANT_CITY: &str = "Plant City";
    pub const ELECTRIFICATION_LEVEL: &str = "Electrification Level";
}

/// The closed set of name→id dictionaries in the catalog.
///
/// Lookup dispatch goes through this enum rather than interpolated table
/// names; an unrecognized name in the catalog is a validation error at load
/// time, never a runtime query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupTable {
    Make,
    Model,
    BodyStyle,
    FuelType,
    DriveType,
    ElectrificationLevel,
    Transmission,
    Country,
    Manufacturer,
    VehicleType,
}

impl LookupTable {
    /// All dictionaries, in catalog order
    pub const ALL: [Self; 10] = [
        Self::Make,
        Self::Model,
        Self::BodyStyle,
        Self::FuelType,
        Self::DriveType,
        Self::ElectrificationLevel,
        Self::Transmission,
        Self::Country,
        Self::Manufacturer,
        Self::VehicleType,
    ];

    /// Parse a catalog table name
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnknownLookupTable` for names outside the
    /// closed set.
    pub fn from_name(name: &str) -> ModelResult<Self> {
        match name {
            "Make" => Ok(Self::Make),
            "Model" => Ok(Self::Model),
            "BodyStyle" => Ok(Self::BodyStyle),
            "FuelType" => Ok(Self::FuelType),
            "DriveType" => Ok(Self::DriveType),
            "ElectrificationLevel" => Ok(Self::ElectrificationLevel),
            "Transmission" => Ok(Self::Transmission),
            "Country" => Ok(Self::Country),
            "Manufacturer" => Ok(Self::Manufacturer),
            "VehicleType" => Ok(Self::VehicleType),
            _ => Err(ModelError::UnknownLookupTable(name.to_string())),
        }
    }

    /// The canonical table name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Make => "Make",
            Self::Model => "Model",
            Self::BodyStyle => "BodyStyle",
            Self::FuelType => "FuelType",
            Self::DriveType => "DriveType",
            Self::ElectrificationLevel => "ElectrificationLevel",
            Self::Transmission => "Transmission",
            Self::Country => "Country",
            Self::Manufacturer => "Manufacturer",
            Self::VehicleType => "VehicleType",
        }
    }
}

/// Provenance of a pattern row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSource {
    /// From the base vPIC-derived catalog
    Official,
    /// From a community overlay layer
    Community,
}

/// World Manufacturer Identifier row.
///
/// `code` is 3 characters, or 6 for low-volume manufacturers (positions
/// 1-3 of the VIN concatenated with positions 12-14).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wmi {
    pub id: i64,
    pub code: String,
    pub manufacturer_id: i64,
    pub make_id: Option<i64>,
    pub vehicle_type_id: Option<i64>,
    pub country_id: Option<i64>,
}

/// A named bundle of positional patterns for one model/variant family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VinSchema {
    pub id: i64,
    pub name: String,
    pub source_wmi: String,
    pub notes: Option<String>,
}

/// Year-ranged link between a WMI and a VIN schema.
///
/// `year_to == None` means open-ended; overlapping ranges are permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmiVinSchema {
    pub id: i64,
    pub wmi_id: i64,
    pub vin_schema_id: i64,
    pub year_from: i32,
    pub year_to: Option<i32>,
}

/// A named vehicle attribute with a priority weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: i64,
    pub name: String,
    pub lookup_table: Option<LookupTable>,
    pub weight: i32,
}

/// Validated 6-character wildcard matcher over VDS positions 4-9
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternKeys(String);

impl PatternKeys {
    /// Validate and wrap a keys string
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidPatternKeys` unless the input is exactly
    /// 6 characters over `{A-Z, 0-9, '*'}`.
    pub fn new(keys: &str) -> ModelResult<Self> {
        let ok = keys.len() == 6
            && keys
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '*');
        if ok {
            Ok(Self(keys.to_string()))
        } else {
            Err(ModelError::InvalidPatternKeys(keys.to_string()))
        }
    }

    /// Match against a 6-character VDS slice.
    ///
    /// Each position matches iff the key character is `'*'` or equals the
    /// VIN character. A VDS of the wrong length never matches.
    #[must_use]
    pub fn matches(&self, vds: &str) -> bool {
        vds.len() == 6
            && self
                .0
                .chars()
                .zip(vds.chars())
                .all(|(k, v)| k == '*' || k == v)
    }

    /// Number of literal (non-wildcard) positions, 0..=6
    #[must_use]
    pub fn specificity(&self) -> u8 {
        self.0.chars().filter(|&c| c != '*').count() as u8
    }

    /// The raw keys string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attribute reference, resolved from the stored string at load time.
///
/// `Pattern.AttributeId` in the catalog stores either a numeric foreign key
/// into the element's lookup table or a literal value; the tagged variant
/// means the matcher never has to guess which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeRef {
    /// Foreign key into a named dictionary
    Lookup(LookupTable, i64),
    /// Literal attribute value
    Literal(String),
}

impl AttributeRef {
    /// Classify a stored attribute string against the element's lookup table
    #[must_use]
    pub fn classify(raw: &str, lookup_table: Option<LookupTable>) -> Self {
        match (lookup_table, raw.trim().parse::<i64>()) {
            (Some(table), Ok(id)) => Self::Lookup(table, id),
            _ => Self::Literal(raw.to_string()),
        }
    }
}

/// A positional pattern mapping a VDS match to one (element, attribute)
/// assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: i64,
    pub vin_schema_id: i64,
    pub keys: PatternKeys,
    pub element_id: i64,
    pub attribute: AttributeRef,
    pub source: PatternSource,
}
