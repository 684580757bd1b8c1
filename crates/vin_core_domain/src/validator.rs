//! VIN structural validation and check-digit verification

use once_cell::sync::Lazy;
use regex::Regex;

use vin_core_models::{CheckDigitComponent, DecodeError, ErrorCode};

/// 17 characters over A-Z, 0-9, excluding I, O, Q
static VIN_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("VIN shape regex is valid"));

/// Position weights for the mod-11 check digit (position 9 weighs 0)
pub const CHECK_DIGIT_WEIGHTS: [u32; 17] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// 0-based index of the check digit (VIN position 9)
pub const CHECK_DIGIT_INDEX: usize = 8;

/// 0-based index of the model-year code (VIN position 10)
pub const MODEL_YEAR_INDEX: usize = 9;

/// Trim and uppercase raw input
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalize and structurally validate a VIN.
///
/// Position-10 `'0'` passes validation; some non-US markets do not encode a
/// model year, and the model-year resolver attaches the warning.
///
/// # Errors
///
/// Returns a fatal `DecodeError` for empty input, wrong length, characters
/// outside the VIN alphabet, or `U`/`Z` at position 10.
pub fn validate(raw: &str) -> Result<String, DecodeError> {
    let vin = normalize(raw);

    if vin.is_empty() {
        return Err(DecodeError::new(ErrorCode::EmptyInput, "VIN is empty"));
    }

    let length = vin.chars().count();
    if length != 17 {
        return Err(DecodeError::new(
            ErrorCode::InvalidLength,
            format!("Expected 17 characters, got {length}"),
        ));
    }

    if !VIN_SHAPE.is_match(&vin) {
        let bad: String = vin
            .chars()
            .filter(|c| !c.is_ascii_alphanumeric() || matches!(c, 'I' | 'O' | 'Q'))
            .collect();
        return Err(DecodeError::new(
            ErrorCode::InvalidCharacters,
            format!("Invalid characters in VIN: {bad}"),
        ));
    }

    // U and Z never encode a model year
    if let Some(year_code) = vin.chars().nth(MODEL_YEAR_INDEX) {
        if matches!(year_code, 'U' | 'Z') {
            return Err(DecodeError::new(
                ErrorCode::InvalidCharacters,
                format!("Position 10 may not be '{year_code}'"),
            ));
        }
    }

    Ok(vin)
}

/// Check-digit transliteration values; I, O, Q have none
const fn transliterate(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        'A' => Some(1),
        'B' => Some(2),
        'C' => Some(3),
        'D' => Some(4),
        'E' => Some(5),
        'F' => Some(6),
        'G' => Some(7),
        'H' => Some(8),
        'J' => Some(1),
        'K' => Some(2),
        'L' => Some(3),
        'M' => Some(4),
        'N' => Some(5),
        'P' => Some(7),
        'R' => Some(9),
        'S' => Some(2),
        'T' => Some(3),
        'U' => Some(4),
        'V' => Some(5),
        'W' => Some(6),
        'X' => Some(7),
        'Y' => Some(8),
        'Z' => Some(9),
        _ => None,
    }
}

/// Verify the weighted mod-11 check digit of a normalized 17-character VIN.
///
/// Remainder 10 maps to `'X'`. A mismatch is reported, not rejected;
/// non-North-American VINs are not required to carry a valid check digit.
#[must_use]
pub fn check_digit(vin: &str) -> CheckDigitComponent {
    let actual = vin.chars().nth(CHECK_DIGIT_INDEX);

    let mut sum: u32 = 0;
    for (c, weight) in vin.chars().zip(CHECK_DIGIT_WEIGHTS) {
        match transliterate(c) {
            Some(value) => sum += value * weight,
            None => {
                return CheckDigitComponent {
                    is_valid: false,
                    expected: None,
                    actual,
                }
            }
        }
    }

    let expected = match sum % 11 {
        10 => 'X',
        r => char::from_digit(r, 10).unwrap_or('?'),
    };

    CheckDigitComponent {
        is_valid: actual == Some(expected),
        expected: Some(expected),
        actual,
    }
}
