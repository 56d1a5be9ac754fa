//! Core domain types: rates, daily rate sets, cache keys, and query options.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ForexError;
use crate::support::{self, Format};

/// The shape an `exchange` caller may hand in for the amount to convert.
/// Rust's type system already rules out the "wrong type entirely" case the
/// source guards against (nil, a list); what remains expressible is a
/// pre-parsed [`Decimal`] or a numeric string that may or may not parse.
#[derive(Clone, Debug, PartialEq)]
pub enum AmountInput {
    Decimal(Decimal),
    Text(String),
}

impl AmountInput {
    /// Resolves to a [`Decimal`], raising `ForexError::Format` for a
    /// string that isn't a valid numeric literal.
    pub fn resolve(self) -> Result<Decimal, ForexError> {
        match self {
            Self::Decimal(d) => Ok(d),
            Self::Text(s) => support::parse_amount(&s),
        }
    }
}

impl From<Decimal> for AmountInput {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One `{currency, rate}` pair quoted against EUR (one EUR equals `rate` of
/// `currency`). EUR's own entry, when present, is always exactly `1`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RateEntry {
    pub currency: String,
    pub rate: Decimal,
}

/// A mapping from ISO alpha code to decimal rate. Backed by a `BTreeMap` so
/// iteration order (and therefore JSON/string rendering) is deterministic.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct RateSet(pub BTreeMap<String, Decimal>);

impl RateSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, currency: impl Into<String>, rate: Decimal) {
        self.0.insert(currency.into(), rate);
    }

    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.0.get(&currency.to_uppercase()).copied()
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.0.contains_key(&currency.to_uppercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// EUR is always present: synthesize `{EUR, 1}` when the upstream feed
    /// omitted it (ECB never enumerates its own base currency).
    pub fn with_eur_synthesized(mut self) -> Self {
        self.0.entry("EUR".to_string()).or_insert(Decimal::ONE);
        self
    }

    /// Restricts the set to `symbols`, applied before any rebasing so a
    /// rebase target explicitly named in `symbols` is still available.
    pub fn filtered(&self, symbols: &[String]) -> Self {
        if symbols.is_empty() {
            return self.clone();
        }
        let wanted: std::collections::HashSet<String> =
            symbols.iter().map(|s| s.to_uppercase()).collect();
        Self(
            self.0
                .iter()
                .filter(|(k, _)| wanted.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        )
    }
}

/// A `{date, base, rates}` triple. `rates` always includes `base` with
/// value exactly one after rebasing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyRateSet {
    pub date: NaiveDate,
    pub base: String,
    pub rates: RateSet,
}

impl DailyRateSet {
    pub fn new(date: NaiveDate, rates: RateSet) -> Self {
        Self { date, base: "EUR".to_string(), rates: rates.with_eur_synthesized() }
    }
}

/// The public shape of a rates query's result: `DailyRateSet` after
/// `QueryOptions::format` and `QueryOptions::keys` have been applied to its
/// rates. Keys are rendered per `keys` (lower-case symbol or upper-case
/// string) and values per `format` (`Decimal` or its canonical string); the
/// internal `RateSet` stays `Decimal`-keyed throughout rebasing and caching,
/// this type exists only at the query boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedDailyRateSet {
    pub date: NaiveDate,
    pub base: String,
    pub rates: BTreeMap<String, support::FormattedValue>,
}

/// A non-empty, most-recent-first sequence of daily rate sets, as returned
/// by a single feed fetch.
pub type FeedPayload = Vec<DailyRateSet>;

/// The three feed kinds, and the matching cache keys. Closed enum per the
/// registry's "no open strings" rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    LatestRates,
    LastNinetyDaysRates,
    HistoricRates,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatestRates => "latest_rates",
            Self::LastNinetyDaysRates => "last_ninety_days_rates",
            Self::HistoricRates => "historic_rates",
        }
    }

    /// `historic_rates` is never on the periodic schedule; it is fetched
    /// on demand only (the feed is decades of data).
    pub fn is_scheduled(&self) -> bool {
        !matches!(self, Self::HistoricRates)
    }

    pub fn scheduled() -> [CacheKey; 2] {
        [CacheKey::LatestRates, CacheKey::LastNinetyDaysRates]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cache row: the stored feed payload plus the instant it was written.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub value: FeedPayload,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Options accepted by a rates query (`base`, `format`, `round`, `symbols`,
/// `keys`, `use_cache`). Mirrors §6's option table; every field has the
/// spec's documented default via [`Default`].
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOptions {
    pub base: String,
    pub format: Format,
    pub round: Option<u32>,
    pub symbols: Vec<String>,
    pub keys: crate::currency::KeyStyle,
    pub use_cache: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            base: "EUR".to_string(),
            format: Format::Decimal,
            round: Some(5),
            symbols: Vec::new(),
            keys: crate::currency::KeyStyle::Symbol,
            use_cache: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_input_resolves_decimal_unchanged() {
        let input = AmountInput::from(dec!(12.5));
        assert_eq!(input.resolve().unwrap(), dec!(12.5));
    }

    #[test]
    fn amount_input_resolves_numeric_string() {
        let input = AmountInput::from("12.5");
        assert_eq!(input.resolve().unwrap(), dec!(12.5));
    }

    #[test]
    fn amount_input_rejects_malformed_string() {
        let input = AmountInput::from("not-a-number");
        assert!(input.resolve().is_err());
    }

    #[test]
    fn rate_set_synthesizes_eur() {
        let mut rates = RateSet::new();
        rates.insert("USD", dec!(1.0772));
        let rates = rates.with_eur_synthesized();
        assert_eq!(rates.get("EUR"), Some(Decimal::ONE));
    }

    #[test]
    fn rate_set_does_not_override_existing_eur() {
        let mut rates = RateSet::new();
        rates.insert("EUR", dec!(1));
        rates.insert("USD", dec!(1.0772));
        let rates = rates.with_eur_synthesized();
        assert_eq!(rates.get("EUR"), Some(Decimal::ONE));
        assert_eq!(rates.len(), 2);
    }

    #[test]
    fn filtered_keeps_only_requested_symbols() {
        let mut rates = RateSet::new();
        rates.insert("USD", dec!(1.0772));
        rates.insert("GBP", dec!(0.83188));
        rates.insert("JPY", dec!(164.18));
        let filtered = rates.filtered(&["USD".to_string(), "GBP".to_string()]);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.contains("usd"));
        assert!(!filtered.contains("JPY"));
    }

    #[test]
    fn empty_symbols_is_a_no_op() {
        let mut rates = RateSet::new();
        rates.insert("USD", dec!(1.0772));
        let filtered = rates.filtered(&[]);
        assert_eq!(filtered, rates);
    }

    #[test]
    fn cache_key_names_match_spec_symbols() {
        assert_eq!(CacheKey::LatestRates.as_str(), "latest_rates");
        assert_eq!(CacheKey::LastNinetyDaysRates.as_str(), "last_ninety_days_rates");
        assert_eq!(CacheKey::HistoricRates.as_str(), "historic_rates");
        assert!(!CacheKey::HistoricRates.is_scheduled());
        assert!(CacheKey::LatestRates.is_scheduled());
    }
}
