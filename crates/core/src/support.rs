//! Normalization helpers shared by the registry, rate model, and engine:
//! currency-code casing, date parsing, and decimal rounding/formatting.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::ForexError;

/// Upper-cases and trims an ISO alpha currency code for table lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Lower-cases an ISO alpha code for symbol-style map keys.
pub fn symbol_key(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Parses a calendar date from any of the three accepted shapes:
/// `YYYY-MM-DD`, an ISO datetime with a trailing `Z`, or will reject
/// anything else (including impossible dates such as Feb 31).
pub fn parse_date(input: &str) -> Result<NaiveDate, ForexError> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }

    if input.ends_with('Z') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc).date_naive());
        }
    }

    Err(ForexError::Date(input.to_string()))
}

/// Builds a date from a `{year, month, day}` tuple, rejecting impossible
/// calendar dates rather than silently normalizing them (e.g. no rolling
/// Feb 31 into Mar 3).
pub fn date_from_ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, ForexError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ForexError::Date(format!("{year:04}-{month:02}-{day:02}")))
}

/// Parses a decimal amount from its numeric-string representation. Any
/// other shape (an empty string, a non-numeric string) is a format error;
/// callers passing a non-string, non-numeric amount type should raise
/// `ForexError::InvalidExchange` instead of reaching this helper.
pub fn parse_amount(input: &str) -> Result<Decimal, ForexError> {
    input.trim().parse::<Decimal>().map_err(|_| ForexError::Format(input.to_string()))
}

/// Rounds a decimal to `round` fractional digits (banker's-rounding-free,
/// half-up, matching the decimal library's default). `None` performs no
/// rounding at all.
pub fn round_decimal(value: Decimal, round: Option<u32>) -> Decimal {
    match round {
        Some(places) => value.round_dp(places.min(15)),
        None => value,
    }
}

/// Output representation requested for a rate or converted amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Decimal,
    String,
}

/// Renders a decimal per the requested [`Format`]. `Format::Decimal` is a
/// no-op marker used by callers that want the `Decimal` itself rather than
/// a string; this function exists for the `Format::String` path and for
/// symmetry with the source's formatter contract.
pub fn format_decimal(value: Decimal, format: Format) -> FormattedValue {
    match format {
        Format::Decimal => FormattedValue::Decimal(value),
        Format::String => FormattedValue::String(value.to_string()),
    }
}

/// Either representation a caller may have asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedValue {
    Decimal(Decimal),
    String(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_plain_iso_date() {
        assert_eq!(parse_date("2024-11-08").unwrap(), NaiveDate::from_ymd_opt(2024, 11, 8).unwrap());
    }

    #[test]
    fn parses_iso_datetime_with_z() {
        assert_eq!(
            parse_date("2024-11-08T00:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 8).unwrap()
        );
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(parse_date("1982-02-25").is_ok());
        assert!(date_from_ymd(2024, 2, 31).is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn rounds_to_requested_places() {
        let v = dec!(1.234567);
        assert_eq!(round_decimal(v, Some(2)), dec!(1.23));
        assert_eq!(round_decimal(v, None), v);
    }

    #[test]
    fn normalizes_code_casing() {
        assert_eq!(normalize_code(" usd "), "USD");
        assert_eq!(symbol_key("USD"), "usd");
    }

    #[test]
    fn string_format_preserves_rounded_trailing_zeros() {
        let rounded = round_decimal(dec!(1.2021), Some(5));
        match format_decimal(rounded, Format::String) {
            FormattedValue::String(s) => assert_eq!(s, "1.20210"),
            _ => panic!("expected string"),
        }
    }
}
