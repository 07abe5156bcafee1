//! Normalization of the date shapes usage reports contain.

use chrono::NaiveDate;
use thiserror::Error;

/// A date-valued field was present but unusable. Per-field, but a record
/// with an unparseable end date cannot be used, so the batch ingestor
/// treats this as a file-level failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DateParseError {
    #[error("expected `weekday day month year ...`, got {count} token(s) in `{raw}`")]
    TooFewTokens { count: usize, raw: String },
    #[error("unrecognized month abbreviation `{0}`")]
    UnknownMonth(String),
    #[error("non-numeric {what} `{token}`")]
    BadNumber { what: &'static str, token: String },
    #[error("`{0}` is not a valid calendar date")]
    OutOfRange(String),
}

const MONTH_ABBREVS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Number of long-form tokens that must exist before the time-of-day part:
/// weekday, day, month abbreviation, year.
const LONG_FORM_MIN_TOKENS: usize = 4;

/// Normalize a raw report date into a calendar date.
///
/// Two shapes exist in the wild:
/// - long form, `Thu 17 Mar 2022 09:14:02 MDT`: day, month abbreviation
///   and year sit at fixed token positions 1..=3, trailing time tokens are
///   ignored;
/// - ISO-like short form, `2023-04-17`.
pub fn normalize(raw: &str) -> Result<NaiveDate, DateParseError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < LONG_FORM_MIN_TOKENS {
        return Err(DateParseError::TooFewTokens {
            count: tokens.len(),
            raw: raw.to_string(),
        });
    }
    let day: u32 = tokens[1].parse().map_err(|_| DateParseError::BadNumber {
        what: "day",
        token: tokens[1].to_string(),
    })?;
    let month = month_from_abbrev(tokens[2])?;
    let year: i32 = tokens[3].parse().map_err(|_| DateParseError::BadNumber {
        what: "year",
        token: tokens[3].to_string(),
    })?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateParseError::OutOfRange(raw.to_string()))
}

/// `Mar` → 3. Tolerates full month names and any casing; only the first
/// three letters decide.
fn month_from_abbrev(token: &str) -> Result<u32, DateParseError> {
    let lowered = token.to_ascii_lowercase();
    MONTH_ABBREVS
        .iter()
        .position(|abbrev| lowered.starts_with(abbrev))
        .map(|index| index as u32 + 1)
        .ok_or_else(|| DateParseError::UnknownMonth(token.to_string()))
}
