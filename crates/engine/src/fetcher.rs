//! The supervised background fetcher: a long-running task owning its own
//! scheduling timer, selecting in a single loop over per-key tickers and an
//! inbound command channel (per-process message passing rather than
//! send-after-ms to a mailbox).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use forex_core::error::ForexError;
use forex_core::types::{CacheKey, FeedPayload};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::cache::{BoxedResolverFuture, Cache, ResolverSpec};
use crate::feed::{FeedKind, FeedOrchestrator};

/// Test-injection hook: given the key being refreshed, produce the future
/// that stands in for the default feed dispatch. Lets tests supply fixture
/// payloads or force errors without touching the network.
pub type FeedFnOverride = Arc<dyn Fn(CacheKey) -> BoxedResolverFuture + Send + Sync>;

fn feed_kind_for(key: CacheKey) -> FeedKind {
    match key {
        CacheKey::LatestRates => FeedKind::Latest,
        CacheKey::LastNinetyDaysRates => FeedKind::NinetyDays,
        CacheKey::HistoricRates => FeedKind::Historic,
    }
}

/// Fetcher construction options (spec §4.4 and §6).
#[derive(Clone)]
pub struct FetcherConfig {
    pub use_cache: bool,
    pub scheduler_interval: Duration,
    pub feed_fn_override: Option<FeedFnOverride>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self { use_cache: true, scheduler_interval: Duration::from_secs(12 * 60 * 60), feed_fn_override: None }
    }
}

enum FetcherCommand {
    Get { key: CacheKey, use_cache: Option<bool>, reply: oneshot::Sender<Result<FeedPayload, ForexError>> },
    Terminate { reply: oneshot::Sender<()> },
}

/// A handle to a running fetcher task. Dropping it without calling
/// [`FetcherHandle::terminate`] leaves the task running; the supervisor is
/// expected to terminate explicitly on `stop`/`delete`.
pub struct FetcherHandle {
    command_tx: mpsc::Sender<FetcherCommand>,
    join_handle: JoinHandle<()>,
}

impl FetcherHandle {
    /// Spawns the fetcher task and returns a handle to it.
    pub fn start(cache: Arc<dyn Cache>, orchestrator: Arc<FeedOrchestrator>, config: FetcherConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let join_handle = tokio::spawn(run_fetcher(cache, orchestrator, config, command_rx));
        Self { command_tx, join_handle }
    }

    /// Serves an on-demand `get`. `use_cache` overrides the fetcher's own
    /// default for this call only (the `use_cache` query option).
    pub async fn get(&self, key: CacheKey, use_cache: Option<bool>) -> Result<FeedPayload, ForexError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(FetcherCommand::Get { key, use_cache, reply })
            .await
            .map_err(|_| ForexError::ResolverFailed)?;
        reply_rx.await.map_err(|_| ForexError::ResolverFailed)?
    }

    /// Stops the task and releases the cache, awaiting its exit.
    pub async fn terminate(self) {
        let (reply, reply_rx) = oneshot::channel();
        if self.command_tx.send(FetcherCommand::Terminate { reply }).await.is_ok() {
            let _ = reply_rx.await;
        }
        let _ = self.join_handle.await;
    }
}

fn resolver_for(
    key: CacheKey,
    orchestrator: &Arc<FeedOrchestrator>,
    feed_fn_override: &Option<FeedFnOverride>,
) -> ResolverSpec {
    match feed_fn_override {
        Some(f) => {
            let f = f.clone();
            ResolverSpec::Closure(Arc::new(move || f(key)))
        }
        None => ResolverSpec::feed(orchestrator.clone(), feed_kind_for(key)),
    }
}

/// Calls the resolver directly and, on success, writes the cache. Failures
/// are returned to the caller rather than panicking; a scheduled refresh
/// turns this into a logged warning without invalidating the prior value.
async fn refresh_key(cache: &Arc<dyn Cache>, key: CacheKey, resolver: ResolverSpec) -> Result<(), ForexError> {
    let value = resolver.call().await?;
    cache.put(key, value, Utc::now()).await?;
    Ok(())
}

async fn is_warm(cache: &Arc<dyn Cache>, ttl: Duration) -> bool {
    for key in CacheKey::scheduled() {
        if cache.get(key, Some(ttl)).await.is_none() {
            return false;
        }
    }
    true
}

async fn handle_get(
    cache: &Arc<dyn Cache>,
    orchestrator: &Arc<FeedOrchestrator>,
    feed_fn_override: &Option<FeedFnOverride>,
    key: CacheKey,
    use_cache_override: Option<bool>,
    default_use_cache: bool,
    ttl: Duration,
) -> Result<FeedPayload, ForexError> {
    let use_cache = use_cache_override.unwrap_or(default_use_cache);
    let resolver = resolver_for(key, orchestrator, feed_fn_override);

    if use_cache && cache.initialized().await {
        cache.resolve(key, &resolver, Some(ttl)).await
    } else {
        resolver.call().await
    }
}

async fn run_fetcher(
    cache: Arc<dyn Cache>,
    orchestrator: Arc<FeedOrchestrator>,
    config: FetcherConfig,
    mut command_rx: mpsc::Receiver<FetcherCommand>,
) {
    if config.use_cache {
        if let Err(e) = cache.init().await {
            tracing::error!("fetcher cache init failed: {e}");
        }
    }

    let warm = config.use_cache && is_warm(&cache, config.scheduler_interval).await;
    if warm {
        tracing::info!("on-disk cache is warm at startup, skipping initial refresh");
    } else {
        let latest_resolver = resolver_for(CacheKey::LatestRates, &orchestrator, &config.feed_fn_override);
        let ninety_resolver = resolver_for(CacheKey::LastNinetyDaysRates, &orchestrator, &config.feed_fn_override);

        let warm_up = tokio::time::timeout(
            Duration::from_secs(20),
            futures::future::join(
                refresh_key(&cache, CacheKey::LatestRates, latest_resolver),
                refresh_key(&cache, CacheKey::LastNinetyDaysRates, ninety_resolver),
            ),
        )
        .await;

        match warm_up {
            Ok((latest, ninety)) => {
                if latest.is_ok() && ninety.is_ok() {
                    tracing::info!("initial warm-up of scheduled feeds succeeded");
                } else {
                    tracing::warn!("initial warm-up partially failed (latest: {:?}, ninety_days: {:?})", latest.is_ok(), ninety.is_ok());
                }
            }
            Err(_) => tracing::warn!("initial warm-up timed out after 20s"),
        }
    }

    let mut latest_ticker = tokio::time::interval(config.scheduler_interval);
    let mut ninety_ticker = tokio::time::interval(config.scheduler_interval);
    latest_ticker.tick().await;
    ninety_ticker.tick().await;

    loop {
        tokio::select! {
            _ = latest_ticker.tick() => {
                let resolver = resolver_for(CacheKey::LatestRates, &orchestrator, &config.feed_fn_override);
                if let Err(e) = refresh_key(&cache, CacheKey::LatestRates, resolver).await {
                    tracing::warn!("scheduled refresh of latest_rates failed: {e}");
                }
            }
            _ = ninety_ticker.tick() => {
                let resolver = resolver_for(CacheKey::LastNinetyDaysRates, &orchestrator, &config.feed_fn_override);
                if let Err(e) = refresh_key(&cache, CacheKey::LastNinetyDaysRates, resolver).await {
                    tracing::warn!("scheduled refresh of last_ninety_days_rates failed: {e}");
                }
            }
            cmd = command_rx.recv() => {
                match cmd {
                    Some(FetcherCommand::Get { key, use_cache, reply }) => {
                        let result = handle_get(
                            &cache,
                            &orchestrator,
                            &config.feed_fn_override,
                            key,
                            use_cache,
                            config.use_cache,
                            config.scheduler_interval,
                        )
                        .await;
                        let _ = reply.send(result);
                    }
                    Some(FetcherCommand::Terminate { reply }) => {
                        if config.use_cache {
                            let _ = cache.terminate().await;
                        }
                        let _ = reply.send(());
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}
