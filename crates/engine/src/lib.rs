//! The concurrent refresh-and-cache engine: fetcher, cache backends, feed
//! orchestrator, rebasing/conversion, and the supervisor that ties them
//! together into one process-owned background service.

pub mod cache;
pub mod cache_sqlite;
pub mod feed;
pub mod fetcher;
pub mod rebase;
pub mod supervisor;

pub use cache::{BoxedResolverFuture, Cache, InMemoryCache, ResolverSpec};
pub use cache_sqlite::SqliteCache;
pub use feed::{FeedKind, FeedOrchestrator, HttpFetch, QuickXmlParse, ReqwestFetch, XmlParse};
pub use fetcher::{FeedFnOverride, FetcherConfig, FetcherHandle};
pub use supervisor::{FetcherStatus, Supervisor, SupervisorConfig, SupervisorError};

use std::sync::Arc;

use std::collections::BTreeMap;

use forex_core::currency;
use forex_core::error::ForexError;
use forex_core::support::{self, FormattedValue};
use forex_core::types::{AmountInput, CacheKey, DailyRateSet, FeedPayload, FormattedDailyRateSet, QueryOptions, RateSet};

/// Top-level facade: the object most callers construct and hold. Owns a
/// [`Supervisor`] and applies symbol filtering, rebasing, rounding, and
/// formatting on top of whatever the fetcher returns.
pub struct ForexEngine {
    supervisor: Supervisor,
}

impl ForexEngine {
    /// Builds the engine without starting its fetcher. If
    /// `supervisor_config.auto_start` is set, call [`ForexEngine::start`]
    /// immediately afterward — construction stays synchronous so it can run
    /// outside an async context.
    pub fn new(
        cache: Arc<dyn Cache>,
        orchestrator: Arc<FeedOrchestrator>,
        fetcher_config: FetcherConfig,
        supervisor_config: SupervisorConfig,
    ) -> Self {
        let supervisor = Supervisor::new(cache, orchestrator, fetcher_config, supervisor_config);
        Self { supervisor }
    }

    pub async fn start(&self) -> Result<(), SupervisorError> {
        self.supervisor.start_fetcher().await
    }

    pub async fn stop(&self) {
        self.supervisor.stop().await;
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Today's rate set, rebased/filtered/rounded per `opts`, with `rates`
    /// rendered per `opts.format`/`opts.keys`.
    pub async fn latest_rates(&self, opts: &QueryOptions) -> Result<FormattedDailyRateSet, ForexError> {
        let payload = self.supervisor.get(CacheKey::LatestRates, Some(opts.use_cache)).await?;
        let day = payload.into_iter().next().ok_or(ForexError::ResolverFailed)?;
        apply_options(day, opts)
    }

    /// The last-90-days feed, each day rebased/filtered/rounded per `opts`.
    pub async fn last_ninety_days_rates(&self, opts: &QueryOptions) -> Result<Vec<FormattedDailyRateSet>, ForexError> {
        let payload = self.supervisor.get(CacheKey::LastNinetyDaysRates, Some(opts.use_cache)).await?;
        payload.into_iter().map(|day| apply_options(day, opts)).collect()
    }

    /// One calendar date out of the full historic feed. A date that fails
    /// to parse, or one not present in the historic set, both surface as
    /// `ForexError::Date`/`ForexError::DateNotFound` (reason `date_error`).
    pub async fn historic_rate(&self, date: &str, opts: &QueryOptions) -> Result<FormattedDailyRateSet, ForexError> {
        let parsed = support::parse_date(date)?;
        let payload = self.supervisor.get(CacheKey::HistoricRates, Some(opts.use_cache)).await?;
        let day = payload
            .into_iter()
            .find(|d| d.date == parsed)
            .ok_or_else(|| ForexError::DateNotFound(date.to_string()))?;
        apply_options(day, opts)
    }

    /// The full historic feed, each day rebased/filtered/rounded per `opts`.
    pub async fn historic_rates(&self, opts: &QueryOptions) -> Result<Vec<FormattedDailyRateSet>, ForexError> {
        let payload = self.supervisor.get(CacheKey::HistoricRates, Some(opts.use_cache)).await?;
        payload.into_iter().map(|day| apply_options(day, opts)).collect()
    }

    /// Historic rates for every calendar date in `[start, end]` (inclusive),
    /// most-recent-first, rebased/filtered/rounded per `opts`. Either bound
    /// failing to parse is always a `ForexError::Date` — the spec.md §9
    /// normalization of a source inconsistency where one branch of the
    /// equivalent operation returned a bare, reason-less error.
    pub async fn historic_rates_between(
        &self,
        start: &str,
        end: &str,
        opts: &QueryOptions,
    ) -> Result<Vec<FormattedDailyRateSet>, ForexError> {
        let start = support::parse_date(start)?;
        let end = support::parse_date(end)?;
        let payload = self.supervisor.get(CacheKey::HistoricRates, Some(opts.use_cache)).await?;

        payload
            .into_iter()
            .filter(|day| day.date >= start && day.date <= end)
            .map(|day| apply_options(day, opts))
            .collect()
    }

    /// Converts `amount` of `from` into `to` using `rates` as the quote
    /// source (EUR synthesized if absent). `amount` accepts a pre-parsed
    /// `Decimal` or a numeric string (a malformed string surfaces as
    /// `ForexError::Format`, per the amount-shape validation in spec §4.5).
    pub fn exchange(
        &self,
        rates: &RateSet,
        amount: impl Into<AmountInput>,
        from: &str,
        to: &str,
        opts: &QueryOptions,
    ) -> Result<FormattedValue, ForexError> {
        rebase::exchange_input(rates, amount.into(), from, to, opts.round, opts.format)
    }
}

/// Applies symbol filtering (before rebasing, so an explicitly included
/// base survives), then rebasing, then rounding, then renders the result
/// per `opts.format` (value representation) and `opts.keys` (key casing).
fn apply_options(day: DailyRateSet, opts: &QueryOptions) -> Result<FormattedDailyRateSet, ForexError> {
    let filtered = day.rates.filtered(&opts.symbols);
    let rebased = rebase::rebase(&filtered, &opts.base)?;

    let mut rates = BTreeMap::new();
    for (code, rate) in rebased.iter() {
        let rounded = support::round_decimal(*rate, opts.round);
        let key = currency::render_key(code, opts.keys);
        rates.insert(key, support::format_decimal(rounded, opts.format));
    }

    Ok(FormattedDailyRateSet { date: day.date, base: support::normalize_code(&opts.base), rates })
}

/// Re-export of the feed payload alias for callers that only need the raw
/// multi-day shape without the options pipeline.
pub type RawFeedPayload = FeedPayload;
