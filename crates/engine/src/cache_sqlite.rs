//! On-disk cache backend. Persists the same `{key, value, updated_at}`
//! semantics as [`crate::cache::InMemoryCache`] to a single SQLite file so
//! the cache survives a process restart.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use forex_core::error::ForexError;
use forex_core::types::{CacheEntry, CacheKey, FeedPayload};
use rusqlite::{params, Connection};

use crate::cache::Cache;

fn key_to_str(key: CacheKey) -> &'static str {
    key.as_str()
}

fn key_from_str(s: &str) -> Option<CacheKey> {
    match s {
        "latest_rates" => Some(CacheKey::LatestRates),
        "last_ninety_days_rates" => Some(CacheKey::LastNinetyDaysRates),
        "historic_rates" => Some(CacheKey::HistoricRates),
        _ => None,
    }
}

/// SQLite-backed cache. The connection is held behind a mutex and opened
/// lazily by `init`; `terminate` drops it so a later `init` reopens cleanly.
pub struct SqliteCache {
    path: String,
    conn: Mutex<Option<Connection>>,
}

impl SqliteCache {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), conn: Mutex::new(None) }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>) -> Result<T, ForexError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(ForexError::ResolverFailed)?;
        f(conn).map_err(|_| ForexError::ResolverFailed)
    }
}

#[async_trait]
impl Cache for SqliteCache {
    async fn init(&self) -> Result<(), ForexError> {
        if let Some(parent) = Path::new(&self.path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let conn = Connection::open(&self.path).map_err(|_| ForexError::ResolverFailed)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS forex_cache (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|_| ForexError::ResolverFailed)?;

        *self.conn.lock().unwrap() = Some(conn);
        Ok(())
    }

    async fn get(&self, key: CacheKey, ttl: Option<Duration>) -> Option<CacheEntry> {
        let row: Option<(Vec<u8>, i64)> = self
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT value, updated_at FROM forex_cache WHERE key = ?1",
                    params![key_to_str(key)],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .ok()
                .map(Ok)
                .unwrap_or(Err(rusqlite::Error::QueryReturnedNoRows))
            })
            .ok();

        let (bytes, millis) = row?;
        let updated_at = Utc.timestamp_millis_opt(millis).single()?;

        if let Some(ttl) = ttl {
            let age = Utc::now().signed_duration_since(updated_at);
            if age.to_std().map(|age| age > ttl).unwrap_or(false) {
                self.delete(key).await;
                return None;
            }
        }

        let value: FeedPayload = bincode::deserialize(&bytes).ok()?;
        Some(CacheEntry { value, updated_at })
    }

    async fn put(&self, key: CacheKey, value: FeedPayload, updated_at: DateTime<Utc>) -> Result<CacheEntry, ForexError> {
        let bytes = bincode::serialize(&value).expect("feed payload is always serializable");
        let millis = updated_at.timestamp_millis();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO forex_cache (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key_to_str(key), bytes, millis],
            )
        })?;
        Ok(CacheEntry { value, updated_at })
    }

    async fn delete(&self, key: CacheKey) {
        let _ = self.with_conn(|conn| conn.execute("DELETE FROM forex_cache WHERE key = ?1", params![key_to_str(key)]));
    }

    async fn last_updated(&self) -> Vec<(CacheKey, DateTime<Utc>)> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, updated_at FROM forex_cache")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            let mut out = Vec::new();
            for row in rows.flatten() {
                if let (Some(key), Some(ts)) = (key_from_str(&row.0), Utc.timestamp_millis_opt(row.1).single()) {
                    out.push((key, ts));
                }
            }
            Ok(out)
        })
        .unwrap_or_default()
    }

    async fn last_updated_key(&self, key: CacheKey) -> Option<DateTime<Utc>> {
        self.get(key, None).await.map(|e| e.updated_at)
    }

    /// Clears stored rows, then closes and reopens the connection so the
    /// backing file handle is never reused across a reset.
    async fn reset(&self) -> Result<(), ForexError> {
        self.with_conn(|conn| conn.execute("DELETE FROM forex_cache", []))?;
        *self.conn.lock().unwrap() = None;
        self.init().await
    }

    async fn terminate(&self) -> Result<(), ForexError> {
        *self.conn.lock().unwrap() = None;
        Ok(())
    }

    async fn initialized(&self) -> bool {
        self.conn.lock().unwrap().is_some()
    }
}
