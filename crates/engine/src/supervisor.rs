//! Supervises one fetcher child: start/stop/restart/delete plus status
//! reporting. Mirrors an OTP-style one-child supervisor's state machine
//! (`not_started -> running <-> stopped -> deleted`) using a task handle
//! instead of a process.

use std::sync::{Arc, Mutex as StdMutex};

use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use crate::cache::Cache;
use crate::feed::FeedOrchestrator;
use crate::fetcher::{FetcherConfig, FetcherHandle};

/// Control-flow errors specific to the supervisor's state machine. Kept
/// separate from [`forex_core::error::ForexError`] because these describe
/// an invalid *transition*, not a feed/cache/currency failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("fetcher already started")]
    AlreadyStarted,
    #[error("fetcher is not running")]
    NotRunning,
    #[error("fetcher is not stopped")]
    NotStopped,
}

/// Observable lifecycle state of the supervised fetcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetcherStatus {
    NotStarted,
    Running,
    Stopped,
}

/// Supervisor construction options.
#[derive(Clone)]
pub struct SupervisorConfig {
    pub auto_start: bool,
    pub name: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self { auto_start: true, name: "forex-fetcher".to_string() }
    }
}

/// Owns a single fetcher child and the resources it is constructed with.
pub struct Supervisor {
    name: String,
    cache: Arc<dyn Cache>,
    orchestrator: Arc<FeedOrchestrator>,
    fetcher_config: FetcherConfig,
    handle: AsyncMutex<Option<FetcherHandle>>,
    status: StdMutex<FetcherStatus>,
}

impl Supervisor {
    /// Builds a supervisor without starting its fetcher. Use
    /// [`Supervisor::start`] or construct via [`SupervisorConfig::auto_start`]
    /// semantics at the call site.
    pub fn new(
        cache: Arc<dyn Cache>,
        orchestrator: Arc<FeedOrchestrator>,
        fetcher_config: FetcherConfig,
        supervisor_config: SupervisorConfig,
    ) -> Self {
        Self {
            name: supervisor_config.name,
            cache,
            orchestrator,
            fetcher_config,
            handle: AsyncMutex::new(None),
            status: StdMutex::new(FetcherStatus::NotStarted),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts the fetcher. Returns `AlreadyStarted` if it is already
    /// running; otherwise valid from `not_started` or `stopped`.
    pub async fn start_fetcher(&self) -> Result<(), SupervisorError> {
        let mut guard = self.handle.lock().await;
        if *self.status.lock().unwrap() == FetcherStatus::Running {
            return Err(SupervisorError::AlreadyStarted);
        }

        let new_handle = FetcherHandle::start(self.cache.clone(), self.orchestrator.clone(), self.fetcher_config.clone());
        *guard = Some(new_handle);
        *self.status.lock().unwrap() = FetcherStatus::Running;
        Ok(())
    }

    /// Stops the fetcher, terminating its task and releasing the cache.
    pub async fn stop_fetcher(&self) -> Result<(), SupervisorError> {
        if *self.status.lock().unwrap() != FetcherStatus::Running {
            return Err(SupervisorError::NotRunning);
        }

        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.take() {
            handle.terminate().await;
        }
        *self.status.lock().unwrap() = FetcherStatus::Stopped;
        Ok(())
    }

    /// Restarts a stopped fetcher. Only valid from `stopped`.
    pub async fn restart_fetcher(&self) -> Result<(), SupervisorError> {
        if *self.status.lock().unwrap() != FetcherStatus::Stopped {
            return Err(SupervisorError::NotStopped);
        }

        let mut guard = self.handle.lock().await;
        let new_handle = FetcherHandle::start(self.cache.clone(), self.orchestrator.clone(), self.fetcher_config.clone());
        *guard = Some(new_handle);
        *self.status.lock().unwrap() = FetcherStatus::Running;
        Ok(())
    }

    /// Deletes the (stopped) fetcher child, returning to `not_started`.
    pub async fn delete_fetcher(&self) -> Result<(), SupervisorError> {
        if *self.status.lock().unwrap() != FetcherStatus::Stopped {
            return Err(SupervisorError::NotStopped);
        }

        *self.status.lock().unwrap() = FetcherStatus::NotStarted;
        Ok(())
    }

    pub fn fetcher_status(&self) -> FetcherStatus {
        *self.status.lock().unwrap()
    }

    pub fn fetcher_initiated(&self) -> bool {
        self.fetcher_status() != FetcherStatus::NotStarted
    }

    pub fn fetcher_running(&self) -> bool {
        self.fetcher_status() == FetcherStatus::Running
    }

    /// Runs the fetcher's on-demand `get`, failing fast if it is not
    /// currently running.
    pub async fn get(
        &self,
        key: forex_core::types::CacheKey,
        use_cache: Option<bool>,
    ) -> Result<forex_core::types::FeedPayload, forex_core::error::ForexError> {
        let guard = self.handle.lock().await;
        match guard.as_ref() {
            Some(handle) => handle.get(key, use_cache).await,
            None => Err(forex_core::error::ForexError::ResolverFailed),
        }
    }

    /// Unconditional shutdown: stops the fetcher if running, otherwise a
    /// no-op. Intended for process-exit cleanup, where the caller does not
    /// want to reason about the current state machine position.
    pub async fn stop(&self) {
        if self.fetcher_running() {
            let _ = self.stop_fetcher().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use std::time::Duration;

    fn build_supervisor() -> Supervisor {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let orchestrator = Arc::new(FeedOrchestrator::with_defaults("https://example.invalid"));
        let fetcher_config = FetcherConfig { use_cache: false, scheduler_interval: Duration::from_secs(3600), feed_fn_override: None };
        Supervisor::new(cache, orchestrator, fetcher_config, SupervisorConfig::default())
    }

    #[tokio::test]
    async fn lifecycle_transitions_match_state_machine() {
        let supervisor = build_supervisor();
        assert_eq!(supervisor.fetcher_status(), FetcherStatus::NotStarted);

        supervisor.start_fetcher().await.unwrap();
        assert_eq!(supervisor.fetcher_status(), FetcherStatus::Running);
        assert!(supervisor.fetcher_running());

        supervisor.stop_fetcher().await.unwrap();
        assert_eq!(supervisor.fetcher_status(), FetcherStatus::Stopped);

        supervisor.restart_fetcher().await.unwrap();
        assert_eq!(supervisor.fetcher_status(), FetcherStatus::Running);

        supervisor.stop_fetcher().await.unwrap();
        supervisor.delete_fetcher().await.unwrap();
        assert_eq!(supervisor.fetcher_status(), FetcherStatus::NotStarted);
    }

    #[tokio::test]
    async fn starting_twice_is_rejected() {
        let supervisor = build_supervisor();
        supervisor.start_fetcher().await.unwrap();
        let err = supervisor.start_fetcher().await.unwrap_err();
        assert_eq!(err, SupervisorError::AlreadyStarted);
    }

    #[tokio::test]
    async fn restart_requires_stopped_state() {
        let supervisor = build_supervisor();
        let err = supervisor.restart_fetcher().await.unwrap_err();
        assert_eq!(err, SupervisorError::NotStopped);
    }

    #[tokio::test]
    async fn stop_is_idempotent_shutdown() {
        let supervisor = build_supervisor();
        supervisor.stop().await;
        assert_eq!(supervisor.fetcher_status(), FetcherStatus::NotStarted);

        supervisor.start_fetcher().await.unwrap();
        supervisor.stop().await;
        assert_eq!(supervisor.fetcher_status(), FetcherStatus::Stopped);
    }
}
