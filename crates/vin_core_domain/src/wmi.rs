//! WMI resolution
//!
//! Determines the applicable World Manufacturer Identifier row and its
//! associated manufacturer, make, country and vehicle type. Supports the
//! 6-character low-volume form (positions 1-3 + 12-14) and codes shared
//! across brands.

use vin_core_models::{LookupTable, Wmi, WmiComponent};
use vin_core_storage::{CatalogStore, StorageResult};

/// A resolved WMI with its display names
#[derive(Debug, Clone)]
pub struct ResolvedWmi {
    pub wmi: Wmi,
    /// Effective make id: the row's own, falling back to the first
    /// `Wmi_Make` link
    pub make_id: Option<i64>,
    pub manufacturer: Option<String>,
    pub make: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub vehicle_type: Option<String>,
}

impl ResolvedWmi {
    /// The result component for this WMI
    #[must_use]
    pub fn to_component(&self) -> WmiComponent {
        WmiComponent {
            code: self.wmi.code.clone(),
            manufacturer: self.manufacturer.clone(),
            make: self.make.clone(),
            country: self.country.clone(),
            region: self.region.clone(),
            vehicle_type: self.vehicle_type.clone(),
        }
    }
}

/// Geographic region band of the leading VIN character
#[must_use]
pub fn region_for(vin: &str) -> Option<&'static str> {
    match vin.chars().next()? {
        'A'..='H' => Some("Africa"),
        'J'..='N' | 'P' | 'R' => Some("Asia"),
        'S'..='Z' => Some("Europe"),
        '1'..='5' => Some("North America"),
        '6' | '7' => Some("Oceania"),
        '8' | '9' => Some("South America"),
        _ => None,
    }
}

/// Resolve the WMI of a normalized 17-character VIN.
///
/// Returns `Ok(None)` when the catalog has no row for the code; the caller
/// turns that into the fatal WMI_NOT_FOUND error.
///
/// # Errors
///
/// Propagates catalog query failures.
pub async fn resolve(store: &dyn CatalogStore, vin: &str) -> StorageResult<Option<ResolvedWmi>> {
    let rows = candidate_rows(store, vin).await?;
    if rows.is_empty() {
        return Ok(None);
    }

    // Shared-code preference chain: rows with a make, then rows with a
    // Wmi_Make link, then lowest id.
    let mut ranked = Vec::with_capacity(rows.len());
    for row in rows {
        let links = store.wmi_make_ids(row.id).await?;
        ranked.push((row, links));
    }
    ranked.sort_by_key(|(row, links)| (row.make_id.is_none(), links.is_empty(), row.id));

    #[allow(clippy::unwrap_used)] // non-empty checked above
    let (row, links) = ranked.into_iter().next().unwrap();

    let make_id = row.make_id.or_else(|| links.first().copied());

    let manufacturer = store
        .lookup_name(LookupTable::Manufacturer, row.manufacturer_id)
        .await?;
    let make = match make_id {
        Some(id) => store.lookup_name(LookupTable::Make, id).await?,
        None => None,
    };
    let country = match row.country_id {
        Some(id) => store.lookup_name(LookupTable::Country, id).await?,
        None => None,
    };
    let vehicle_type = match row.vehicle_type_id {
        Some(id) => store.lookup_name(LookupTable::VehicleType, id).await?,
        None => None,
    };

    tracing::debug!(
        code = %row.code,
        make = make.as_deref().unwrap_or("-"),
        "Resolved WMI"
    );

    Ok(Some(ResolvedWmi {
        wmi: row,
        make_id,
        manufacturer,
        make,
        country,
        region: region_for(vin).map(str::to_string),
        vehicle_type,
    }))
}

/// Candidate rows for the VIN's code, probing the low-volume 6-character
/// form first when position 3 is `'9'`
async fn candidate_rows(store: &dyn CatalogStore, vin: &str) -> StorageResult<Vec<Wmi>> {
    let short_code = &vin[..3];

    if vin.as_bytes().get(2) == Some(&b'9') {
        let extended: String = format!("{}{}", short_code, &vin[11..14]);
        let rows = store.wmis_by_code(&extended).await?;
        if !rows.is_empty() {
            return Ok(rows);
        }
    }

    store.wmis_by_code(short_code).await
}
