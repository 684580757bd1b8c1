//! Result assembly
//!
//! Groups the winning attributes into the named result components.

use vin_core_models::{
    element, CheckDigitComponent, Components, EngineComponent, ModelYearComponent, PatternMatch,
    PlantComponent, VehicleComponent,
};

use crate::matcher::MatchOutcome;
use crate::wmi::ResolvedWmi;

/// 0-based index of the plant code (VIN position 11)
const PLANT_CODE_INDEX: usize = 10;

/// Compose the component groups for a decode that reached the matcher
#[must_use]
pub fn assemble(
    vin: &str,
    wmi: &ResolvedWmi,
    model_year: ModelYearComponent,
    check_digit: CheckDigitComponent,
    outcome: &MatchOutcome,
) -> Components {
    let attr = |name: &str| outcome.value_of(name).map(str::to_string);

    let vehicle = VehicleComponent {
        // The WMI's make backstops schemas that carry no Make pattern
        make: attr(element::MAKE).or_else(|| wmi.make.clone()),
        model: attr(element::MODEL),
        year: model_year.year,
        series: attr(element::SERIES),
        body_style: attr(element::BODY_CLASS),
        drive_type: attr(element::DRIVE_TYPE),
        fuel_type: attr(element::FUEL_TYPE_PRIMARY),
        doors: attr(element::DOORS),
    };

    let engine = EngineComponent {
        model: attr(element::ENGINE_MODEL),
        cylinders: attr(element::ENGINE_CYLINDERS),
        displacement: attr(element::DISPLACEMENT_L),
        fuel: attr(element::FUEL_TYPE_PRIMARY),
    };

    let plant = vin.chars().nth(PLANT_CODE_INDEX).map(|code| PlantComponent {
        country: attr(element::PLANT_COUNTRY),
        city: attr(element::PLANT_CITY),
        code,
    });

    Components {
        vehicle,
        wmi: Some(wmi.to_component()),
        plant,
        engine,
        model_year,
        check_digit: Some(check_digit),
    }
}

/// The ranked winning matches for the pattern-details view
#[must_use]
pub fn winning_matches(outcome: &MatchOutcome) -> Vec<PatternMatch> {
    outcome.selected.iter().map(|a| a.to_match()).collect()
}

/// Every candidate, losers included, for the raw-data view
#[must_use]
pub fn all_matches(outcome: &MatchOutcome) -> Vec<PatternMatch> {
    outcome.candidates.iter().map(|a| a.to_match()).collect()
}
