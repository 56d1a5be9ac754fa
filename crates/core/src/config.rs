//! Process-wide configuration, read once and threaded through the
//! supervisor at construction time.
//!
//! Unlike a deployed web backend, this is a library: every field has a sane
//! default, so `Config::from_env()` never panics on a missing variable.

use std::sync::OnceLock;
use std::time::Duration;

/// Process-wide settings for the fetcher, cache, and feed orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL for the ECB feed endpoints (no trailing slash).
    pub feed_base_url: String,
    /// How often the fetcher refetches each scheduled key.
    pub scheduler_interval: Duration,
    /// Default cache backend; `true` selects the on-disk backend.
    pub persist_cache: bool,
    /// Path to the on-disk cache file, used when `persist_cache` is set.
    pub cache_file_path: String,
    /// Whether the fetcher consults the cache at all (bypassing it makes
    /// every `get` hit the network directly).
    pub use_cache: bool,
    /// Whether the supervisor auto-starts its fetcher child on construction.
    pub auto_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_base_url: "https://www.ecb.europa.eu/stats/eurofxref".to_string(),
            scheduler_interval: Duration::from_secs(12 * 60 * 60),
            persist_cache: false,
            cache_file_path: default_cache_file_path(),
            use_cache: true,
            auto_start: true,
        }
    }
}

fn default_cache_file_path() -> String {
    let data_dir = dirs_data_dir();
    format!("{data_dir}/.forex_cache")
}

/// A small stand-in for a platform data directory, avoiding a dependency
/// pulled in purely for one path; falls back to the current directory.
fn dirs_data_dir() -> String {
    std::env::var("XDG_DATA_HOME")
        .or_else(|_| std::env::var("HOME").map(|h| format!("{h}/.local/share")))
        .unwrap_or_else(|_| ".".to_string())
}

impl Config {
    /// Loads overrides from the environment (via a `.env` file if present),
    /// falling back to [`Default`] for anything unset or unparseable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            feed_base_url: std::env::var("FOREX_FEED_BASE_URL").unwrap_or(defaults.feed_base_url),
            scheduler_interval: std::env::var("FOREX_SCHEDULER_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.scheduler_interval),
            persist_cache: std::env::var("FOREX_PERSIST_CACHE")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.persist_cache),
            cache_file_path: std::env::var("FOREX_CACHE_FILE_PATH").unwrap_or(defaults.cache_file_path),
            use_cache: std::env::var("FOREX_USE_CACHE")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.use_cache),
            auto_start: std::env::var("FOREX_AUTO_START")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.auto_start),
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Returns the process-wide configuration, loading it from the environment
/// on first access.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_never_panic() {
        let cfg = Config::default();
        assert_eq!(cfg.feed_base_url, "https://www.ecb.europa.eu/stats/eurofxref");
        assert_eq!(cfg.scheduler_interval, Duration::from_secs(12 * 60 * 60));
        assert!(cfg.use_cache);
        assert!(cfg.auto_start);
    }

    #[test]
    fn cache_file_path_is_nonempty() {
        assert!(!Config::default().cache_file_path.is_empty());
    }
}
