//! Link lifetimes written as `<magnitude><unit>`, e.g. `90s`, `12h` or `34d`.

use derive_more::{Display, Error};
use time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum DurationError {
    #[display("'{input}' is too short; expected a number followed by s, m, h or d")]
    TooShort { input: String },

    #[display("'{input}' has no unit; expected s, m, h or d")]
    MissingUnit { input: String },

    #[display("unsupported unit '{unit}'; expected s, m, h or d")]
    UnknownUnit { unit: char },

    #[display("'{magnitude}' is not a whole number")]
    InvalidMagnitude { magnitude: String },

    #[display("duration must be greater than zero")]
    Zero,

    #[display("'{input}' is too long to represent")]
    Overflow { input: String },
}

/// Parse a link lifetime.
///
/// Surrounding whitespace is ignored and the unit is case-insensitive. The
/// magnitude must be a positive run of ASCII digits: signs, decimals and
/// embedded whitespace are rejected.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    let Some((split, unit)) = trimmed.char_indices().last() else {
        return Err(DurationError::TooShort {
            input: input.to_string(),
        });
    };
    if unit.is_ascii_digit() {
        return Err(DurationError::MissingUnit {
            input: trimmed.to_string(),
        });
    }

    let magnitude = &trimmed[..split];
    if magnitude.is_empty() {
        return Err(DurationError::TooShort {
            input: trimmed.to_string(),
        });
    }
    if !magnitude.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DurationError::InvalidMagnitude {
            magnitude: magnitude.to_string(),
        });
    }

    let overflow = || DurationError::Overflow {
        input: trimmed.to_string(),
    };
    let value = magnitude.parse::<i64>().map_err(|_| overflow())?;
    if value == 0 {
        return Err(DurationError::Zero);
    }

    let unit_seconds = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        other => return Err(DurationError::UnknownUnit { unit: other }),
    };
    value
        .checked_mul(unit_seconds)
        .map(Duration::seconds)
        .ok_or_else(overflow)
}
