//! Model-year resolution
//!
//! Position 10 encodes the model year on a 30-year cycle; position 7
//! disambiguates which half of the cycle applies. Non-US VINs may carry
//! `'0'` at position 10 and encode no year at all.

use vin_core_models::{DecodeError, ErrorCode, ModelYearComponent, YearSource};

use crate::validator::MODEL_YEAR_INDEX;

/// 0-based index of the cycle hint (VIN position 7)
const CYCLE_HINT_INDEX: usize = 6;

/// The early half of the 30-year cycle; the late half is `year + 30`.
/// I, O, Q, U, Z and 0 do not appear.
const CYCLE: [(char, i32); 30] = [
    ('A', 1980),
    ('B', 1981),
    ('C', 1982),
    ('D', 1983),
    ('E', 1984),
    ('F', 1985),
    ('G', 1986),
    ('H', 1987),
    ('J', 1988),
    ('K', 1989),
    ('L', 1990),
    ('M', 1991),
    ('N', 1992),
    ('P', 1993),
    ('R', 1994),
    ('S', 1995),
    ('T', 1996),
    ('V', 1997),
    ('W', 1998),
    ('X', 1999),
    ('Y', 2000),
    ('1', 2001),
    ('2', 2002),
    ('3', 2003),
    ('4', 2004),
    ('5', 2005),
    ('6', 2006),
    ('7', 2007),
    ('8', 2008),
    ('9', 2009),
];

/// Outcome of model-year resolution
#[derive(Debug, Clone)]
pub struct ModelYearResolution {
    pub component: ModelYearComponent,
    pub warnings: Vec<DecodeError>,
}

/// Resolve the model year of a normalized 17-character VIN.
///
/// An explicit override always wins. Otherwise position 10 selects the
/// cycle pair and position 7 picks the half: alphabetic means 2010-2039,
/// numeric means 1980-2009. A year more than two years past `now_year`
/// falls back to the other half.
#[must_use]
pub fn resolve(vin: &str, override_year: Option<i32>, now_year: i32) -> ModelYearResolution {
    let mut warnings = Vec::new();

    let year_code = vin.chars().nth(MODEL_YEAR_INDEX);
    if year_code == Some('0') {
        warnings.push(DecodeError::new(
            ErrorCode::NonUsYear,
            "Position 10 is '0'; this VIN does not encode a model year",
        ));
    }

    if let Some(year) = override_year {
        return ModelYearResolution {
            component: ModelYearComponent {
                year: Some(year),
                source: YearSource::Override,
                confidence: 1.0,
            },
            warnings,
        };
    }

    let early = year_code.and_then(|code| {
        CYCLE
            .iter()
            .find(|(cycle_code, _)| *cycle_code == code)
            .map(|(_, year)| *year)
    });

    let Some(early) = early else {
        return ModelYearResolution {
            component: ModelYearComponent::default(),
            warnings,
        };
    };

    let hint_is_alphabetic = vin
        .chars()
        .nth(CYCLE_HINT_INDEX)
        .is_some_and(|c| c.is_ascii_alphabetic());

    let late = early + 30;
    let mut year = if hint_is_alphabetic { late } else { early };
    let mut confidence = 1.0;

    // A decode running "today" cannot see vehicles much past next year's
    // model introductions; fall back to the other cycle half.
    if year > now_year + 2 {
        year = if year == late { early } else { late };
        confidence = 0.8;
    }

    ModelYearResolution {
        component: ModelYearComponent {
            year: Some(year),
            source: YearSource::Decoded,
            confidence,
        },
        warnings,
    }
}
