//! Rebasing (re-expressing an EUR-quoted rate set against another base)
//! and amount conversion across arbitrary currency pairs.

use forex_core::currency;
use forex_core::error::ForexError;
use forex_core::support::{self, Format, FormattedValue};
use forex_core::types::{AmountInput, RateSet};
use rust_decimal::Decimal;

/// Re-expresses `rates` (EUR-quoted) relative to `base`.
///
/// - `base == EUR` returns the set unchanged.
/// - An unknown `base` is a `BaseCurrencyNotFound` error.
/// - A `base` not present in `rates` returns the set unchanged (rebasing
///   is impossible without that currency's own EUR quote).
/// - Otherwise every entry `{C, r_C}` becomes `{C, r_C / r_B}`, and `base`
///   itself becomes exactly `1`.
pub fn rebase(rates: &RateSet, base: &str) -> Result<RateSet, ForexError> {
    let base_code = support::normalize_code(base);

    if base_code == "EUR" {
        return Ok(rates.clone());
    }

    if !currency::exists(&base_code) {
        return Err(ForexError::BaseCurrencyNotFound(base_code));
    }

    let Some(r_base) = rates.get(&base_code) else {
        return Ok(rates.clone());
    };

    let mut out = RateSet::new();
    for (code, rate) in rates.iter() {
        if code.eq_ignore_ascii_case(&base_code) {
            out.insert(code.clone(), Decimal::ONE);
        } else {
            let rebased = rate
                .checked_div(r_base)
                .ok_or_else(|| ForexError::InvalidExchange(format!("cannot rebase against {base_code}'s zero rate")))?;
            out.insert(code.clone(), rebased);
        }
    }
    Ok(out)
}

/// Converts `amount` of `from` into `to`, using `rates` (EUR synthesized if
/// absent) as the quote source. Applies `round` then `format` to the
/// result.
pub fn exchange(
    rates: &RateSet,
    amount: Decimal,
    from: &str,
    to: &str,
    round: Option<u32>,
    format: Format,
) -> Result<FormattedValue, ForexError> {
    let from_code = support::normalize_code(from);
    let to_code = support::normalize_code(to);

    if !currency::exists(&from_code) {
        return Err(ForexError::Currency(from_code));
    }
    if !currency::exists(&to_code) {
        return Err(ForexError::Currency(to_code));
    }

    let rates = rates.clone().with_eur_synthesized();
    let r_from = rates.get(&from_code).ok_or_else(|| ForexError::Currency(from_code.clone()))?;
    let r_to = rates.get(&to_code).ok_or_else(|| ForexError::Currency(to_code.clone()))?;

    let ratio = r_to
        .checked_div(r_from)
        .ok_or_else(|| ForexError::InvalidExchange(format!("cannot divide by {from_code}'s zero rate")))?;
    let result = amount
        .checked_mul(ratio)
        .ok_or_else(|| ForexError::InvalidExchange("overflow computing exchange result".to_string()))?;

    let result = support::round_decimal(result, round);
    Ok(support::format_decimal(result, format))
}

/// Same as [`exchange`] but accepts an [`AmountInput`] — a pre-parsed
/// [`Decimal`] or a numeric string — resolving it first. A string that
/// doesn't parse as a numeric literal surfaces as `ForexError::Format`,
/// matching the spec's amount-shape validation.
pub fn exchange_input(
    rates: &RateSet,
    amount: AmountInput,
    from: &str,
    to: &str,
    round: Option<u32>,
    format: Format,
) -> Result<FormattedValue, ForexError> {
    let amount = amount.resolve()?;
    exchange(rates, amount, from, to, round, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ecb_sample() -> RateSet {
        let mut rates = RateSet::new();
        rates.insert("USD", dec!(1.0772));
        rates.insert("GBP", dec!(0.83188));
        rates.insert("JPY", dec!(164.18));
        rates.with_eur_synthesized()
    }

    #[test]
    fn rebase_to_eur_is_a_no_op() {
        let rates = ecb_sample();
        let rebased = rebase(&rates, "EUR").unwrap();
        assert_eq!(rebased, rates);
    }

    #[test]
    fn rebase_to_usd_matches_scenario() {
        let rates = ecb_sample();
        let rebased = rebase(&rates, "USD").unwrap();
        assert_eq!(rebased.get("USD"), Some(Decimal::ONE));
        assert_eq!(rebased.get("EUR").unwrap(), Decimal::ONE / dec!(1.0772));
        assert_eq!(rebased.get("GBP").unwrap(), dec!(0.83188) / dec!(1.0772));
        assert_eq!(rebased.get("JPY").unwrap(), dec!(164.18) / dec!(1.0772));
    }

    #[test]
    fn rebase_to_unknown_base_errors() {
        let rates = ecb_sample();
        let err = rebase(&rates, "ZZZ").unwrap_err();
        assert!(matches!(err, ForexError::BaseCurrencyNotFound(_)));
    }

    #[test]
    fn rebase_against_a_zero_rate_base_is_an_invalid_exchange_error() {
        let mut rates = RateSet::new();
        rates.insert("USD", dec!(1.0772));
        rates.insert("CHF", Decimal::ZERO);
        let rates = rates.with_eur_synthesized();
        let err = rebase(&rates, "CHF").unwrap_err();
        assert!(matches!(err, ForexError::InvalidExchange(_)));
    }

    #[test]
    fn rebase_to_absent_currency_is_unchanged() {
        let mut rates = RateSet::new();
        rates.insert("USD", dec!(1.0772));
        let rates = rates.with_eur_synthesized();
        let rebased = rebase(&rates, "GBP").unwrap();
        assert_eq!(rebased, rates);
    }

    #[test]
    fn rebase_round_trip_returns_original() {
        let rates = ecb_sample();
        let rebased = rebase(&rates, "USD").unwrap();
        let back = rebase(&rebased, "EUR").unwrap();
        for (code, rate) in rates.iter() {
            let round_tripped = back.get(code).unwrap();
            let diff = (*rate - round_tripped).abs();
            assert!(diff < dec!(0.0000000001), "{code}: {rate} vs {round_tripped}");
        }
    }

    #[test]
    fn exchange_gbp_to_eur_matches_scenario() {
        let rates = ecb_sample();
        let result = exchange(&rates, dec!(1), "GBP", "EUR", Some(5), Format::Decimal).unwrap();
        match result {
            FormattedValue::Decimal(d) => assert_eq!(d, dec!(1.20210)),
            _ => panic!("expected decimal"),
        }
    }

    #[test]
    fn exchange_zero_is_exactly_zero() {
        let rates = ecb_sample();
        let result = exchange(&rates, Decimal::ZERO, "USD", "GBP", Some(5), Format::Decimal).unwrap();
        assert_eq!(result, FormattedValue::Decimal(Decimal::ZERO));
    }

    #[test]
    fn exchange_is_antisymmetric_for_negative_amounts() {
        let rates = ecb_sample();
        let positive = exchange(&rates, dec!(10), "USD", "GBP", Some(10), Format::Decimal).unwrap();
        let negative = exchange(&rates, dec!(-10), "USD", "GBP", Some(10), Format::Decimal).unwrap();
        match (positive, negative) {
            (FormattedValue::Decimal(p), FormattedValue::Decimal(n)) => assert_eq!(p, -n),
            _ => panic!("expected decimals"),
        }
    }

    #[test]
    fn exchange_eur_to_eur_returns_input_amount() {
        let rates = ecb_sample();
        let result = exchange(&rates, dec!(42), "EUR", "EUR", Some(2), Format::Decimal).unwrap();
        assert_eq!(result, FormattedValue::Decimal(dec!(42.00)));
    }

    #[test]
    fn exchange_symmetry_within_rounding_tolerance() {
        let rates = ecb_sample();
        let forward = match exchange(&rates, dec!(1), "USD", "GBP", Some(10), Format::Decimal).unwrap() {
            FormattedValue::Decimal(d) => d,
            _ => unreachable!(),
        };
        let backward = match exchange(&rates, forward, "GBP", "USD", Some(10), Format::Decimal).unwrap() {
            FormattedValue::Decimal(d) => d,
            _ => unreachable!(),
        };
        let diff = (backward - dec!(1)).abs();
        assert!(diff < dec!(0.0000000001));
    }

    #[test]
    fn exchange_unknown_currency_is_a_currency_error() {
        let rates = ecb_sample();
        let err = exchange(&rates, dec!(1), "ZZZ", "EUR", None, Format::Decimal).unwrap_err();
        assert!(matches!(err, ForexError::Currency(_)));
    }

    #[test]
    fn exchange_input_accepts_numeric_string_amount() {
        let rates = ecb_sample();
        let result = exchange_input(&rates, AmountInput::from("1"), "GBP", "EUR", Some(5), Format::Decimal).unwrap();
        assert_eq!(result, FormattedValue::Decimal(dec!(1.20210)));
    }

    #[test]
    fn exchange_input_rejects_malformed_string_amount() {
        let rates = ecb_sample();
        let err = exchange_input(&rates, AmountInput::from("not-a-number"), "GBP", "EUR", Some(5), Format::Decimal)
            .unwrap_err();
        assert!(matches!(err, ForexError::Format(_)));
    }

    #[test]
    fn string_format_renders_canonical_decimal_string() {
        let rates = ecb_sample();
        let result = exchange(&rates, dec!(1), "GBP", "EUR", Some(5), Format::String).unwrap();
        assert_eq!(result, FormattedValue::String("1.20210".to_string()));
    }
}
