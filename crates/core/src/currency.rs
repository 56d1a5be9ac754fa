//! Static currency registry.
//!
//! The table below is a compile-time constant: 41 entries, ~31 enabled
//! (published in the ECB daily feed) and ~10 disabled (present only in
//! historic feeds, or currently suspended). Code lookup is case-insensitive
//! and never panics outside the `_or_fail` variants.

use crate::error::ForexError;

/// Selects how map keys are rendered by registry queries that return a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// Lower-case symbol-like keys (`"usd"`).
    #[default]
    Symbol,
    /// Upper-case ISO strings (`"USD"`).
    String,
}

/// One row of the static currency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub name: &'static str,
    pub iso_alpha: &'static str,
    pub iso_numeric: &'static str,
    pub symbol: &'static str,
    pub subunit: f64,
    pub subunit_name: &'static str,
    pub alt_names: &'static [&'static str],
    pub alt_symbols: &'static [&'static str],
    pub enabled: bool,
}

macro_rules! currency {
    ($name:expr, $alpha:expr, $numeric:expr, $symbol:expr, $subunit:expr, $subunit_name:expr, $alt_names:expr, $alt_symbols:expr, $enabled:expr) => {
        Currency {
            name: $name,
            iso_alpha: $alpha,
            iso_numeric: $numeric,
            symbol: $symbol,
            subunit: $subunit,
            subunit_name: $subunit_name,
            alt_names: $alt_names,
            alt_symbols: $alt_symbols,
            enabled: $enabled,
        }
    };
}

/// The full registry, 41 rows. Order is the registry's canonical iteration
/// order; callers must not rely on ISO-alpha sort.
pub static CURRENCIES: &[Currency] = &[
    currency!("Euro", "EUR", "978", "€", 0.01, "Cent", &["euro"], &["€"], true),
    currency!("United States Dollar", "USD", "840", "$", 0.01, "Cent", &["us dollar"], &["$", "US$"], true),
    currency!("Japanese Yen", "JPY", "392", "¥", 1.0, "Sen", &["yen"], &["¥"], true),
    currency!("Bulgarian Lev", "BGN", "975", "лв", 0.01, "Stotinka", &[], &[], true),
    currency!("Czech Koruna", "CZK", "203", "Kč", 0.01, "Haléř", &[], &[], true),
    currency!("Danish Krone", "DKK", "208", "kr", 0.01, "Øre", &[], &[], true),
    currency!("Pound Sterling", "GBP", "826", "£", 0.01, "Penny", &["british pound", "sterling"], &["£"], true),
    currency!("Hungarian Forint", "HUF", "348", "Ft", 1.0, "Fillér", &[], &[], true),
    currency!("Polish Zloty", "PLN", "985", "zł", 0.01, "Grosz", &["zloty"], &[], true),
    currency!("Romanian Leu", "RON", "946", "lei", 0.01, "Ban", &[], &[], true),
    currency!("Swedish Krona", "SEK", "752", "kr", 0.01, "Öre", &[], &[], true),
    currency!("Swiss Franc", "CHF", "756", "Fr", 0.01, "Rappen", &[], &[], true),
    currency!("Icelandic Krona", "ISK", "352", "kr", 1.0, "Eyrir", &[], &[], true),
    currency!("Norwegian Krone", "NOK", "578", "kr", 0.01, "Øre", &[], &[], true),
    currency!("Turkish Lira", "TRY", "949", "₺", 0.01, "Kurus", &[], &["₺"], true),
    currency!("Australian Dollar", "AUD", "036", "$", 0.01, "Cent", &[], &["A$"], true),
    currency!("Brazilian Real", "BRL", "986", "R$", 0.01, "Centavo", &[], &[], true),
    currency!("Canadian Dollar", "CAD", "124", "$", 0.01, "Cent", &[], &["C$"], true),
    currency!("Chinese Yuan", "CNY", "156", "¥", 0.01, "Fen", &["renminbi"], &["RMB"], true),
    currency!("Hong Kong Dollar", "HKD", "344", "$", 0.01, "Cent", &[], &["HK$"], true),
    currency!("Indonesian Rupiah", "IDR", "360", "Rp", 0.01, "Sen", &[], &[], true),
    currency!("Israeli New Shekel", "ILS", "376", "₪", 0.01, "Agora", &["shekel"], &["₪"], true),
    currency!("Indian Rupee", "INR", "356", "₹", 0.01, "Paisa", &[], &["₹"], true),
    currency!("South Korean Won", "KRW", "410", "₩", 1.0, "Jeon", &["won"], &["₩"], true),
    currency!("Mexican Peso", "MXN", "484", "$", 0.01, "Centavo", &[], &["Mex$"], true),
    currency!("Malaysian Ringgit", "MYR", "458", "RM", 0.01, "Sen", &[], &[], true),
    currency!("New Zealand Dollar", "NZD", "554", "$", 0.01, "Cent", &[], &["NZ$"], true),
    currency!("Philippine Peso", "PHP", "608", "₱", 0.01, "Centavo", &[], &["₱"], true),
    currency!("Singapore Dollar", "SGD", "702", "$", 0.01, "Cent", &[], &["S$"], true),
    currency!("Thai Baht", "THB", "764", "฿", 0.01, "Satang", &[], &["฿"], true),
    currency!("South African Rand", "ZAR", "710", "R", 0.01, "Cent", &[], &[], true),
    currency!("Cyprus Pound", "CYP", "196", "£", 0.01, "Cent", &[], &[], false),
    currency!("Estonian Kroon", "EEK", "233", "kr", 0.01, "Sent", &[], &[], false),
    currency!("Lithuanian Litas", "LTL", "440", "Lt", 0.01, "Centas", &[], &[], false),
    currency!("Latvian Lats", "LVL", "428", "Ls", 0.01, "Santims", &[], &[], false),
    currency!("Maltese Lira", "MTL", "470", "₤", 0.01, "Cent", &[], &[], false),
    currency!("Slovak Koruna", "SKK", "703", "Sk", 0.01, "Halier", &[], &[], false),
    currency!("Romanian Leu (old)", "ROL", "642", "lei", 0.01, "Ban", &[], &[], false),
    currency!("Turkish Lira (old)", "TRL", "792", "₺", 0.01, "Kurus", &[], &[], false),
    currency!("Croatian Kuna", "HRK", "191", "kn", 0.01, "Lipa", &[], &[], false),
    currency!("Russian Ruble", "RUB", "643", "₽", 0.01, "Kopek", &["rouble"], &["₽"], false),
];

/// Returns every registry row as `(key, Currency)` pairs.
pub fn all(keys: KeyStyle) -> Vec<(String, Currency)> {
    CURRENCIES.iter().map(|c| (render_key(c.iso_alpha, keys), *c)).collect()
}

/// Returns only enabled (currently-published) rows.
pub fn available(keys: KeyStyle) -> Vec<(String, Currency)> {
    all(keys).into_iter().filter(|(_, c)| c.enabled).collect()
}

/// Returns only disabled (historic-only or suspended) rows.
pub fn disabled(keys: KeyStyle) -> Vec<(String, Currency)> {
    all(keys).into_iter().filter(|(_, c)| !c.enabled).collect()
}

/// Renders an ISO-alpha code as a map key per `keys` (lower-case symbol or
/// upper-case string). Shared by the registry listing functions and by the
/// rates-query output pipeline.
pub fn render_key(iso_alpha: &str, keys: KeyStyle) -> String {
    match keys {
        KeyStyle::Symbol => iso_alpha.to_lowercase(),
        KeyStyle::String => iso_alpha.to_uppercase(),
    }
}

/// Case-insensitive lookup by ISO alpha code. Returns `None` for unknown or
/// malformed codes rather than panicking.
pub fn get(code: &str) -> Option<Currency> {
    let normalized = code.trim().to_uppercase();
    CURRENCIES.iter().find(|c| c.iso_alpha == normalized).copied()
}

/// Same as [`get`] but raises a typed error instead of returning `None`.
pub fn get_or_fail(code: &str) -> Result<Currency, ForexError> {
    get(code).ok_or_else(|| ForexError::Currency(code.to_string()))
}

/// True iff `code` names a known currency (enabled or disabled).
pub fn exists(code: &str) -> bool {
    get(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_forty_one_entries() {
        assert_eq!(CURRENCIES.len(), 41);
    }

    #[test]
    fn available_and_disabled_partition_all() {
        let all_codes: std::collections::HashSet<_> =
            all(KeyStyle::String).into_iter().map(|(k, _)| k).collect();
        let avail: std::collections::HashSet<_> =
            available(KeyStyle::String).into_iter().map(|(k, _)| k).collect();
        let disab: std::collections::HashSet<_> =
            disabled(KeyStyle::String).into_iter().map(|(k, _)| k).collect();

        assert!(avail.is_disjoint(&disab));
        let union: std::collections::HashSet<_> = avail.union(&disab).cloned().collect();
        assert_eq!(union, all_codes);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(get("usd").is_some());
        assert!(get("Usd").is_some());
        assert!(get("USD").is_some());
        assert_eq!(get("usd").unwrap().iso_alpha, "USD");
    }

    #[test]
    fn unknown_code_is_not_found() {
        assert!(get("ZZZ").is_none());
        assert!(!exists("ZZZ"));
        assert!(get_or_fail("ZZZ").is_err());
    }

    #[test]
    fn disabled_currency_is_excluded_from_available() {
        assert!(get("HRK").is_some());
        assert!(!get("HRK").unwrap().enabled);
        let avail_codes: Vec<_> = available(KeyStyle::String).into_iter().map(|(k, _)| k).collect();
        assert!(!avail_codes.contains(&"HRK".to_string()));
    }

    #[test]
    fn key_style_renders_as_requested() {
        let (sym_key, _) = get("USD").map(|c| (render_key(c.iso_alpha, KeyStyle::Symbol), c)).unwrap();
        let (str_key, _) = get("USD").map(|c| (render_key(c.iso_alpha, KeyStyle::String), c)).unwrap();
        assert_eq!(sym_key, "usd");
        assert_eq!(str_key, "USD");
    }
}
