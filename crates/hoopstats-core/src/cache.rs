// Directory-backed response cache.
//
// Entries live in `<dir>/cache.db`, an SQLite file keyed by
// (namespace, key). The namespace names the computation that produced the
// value so different fetchers can share one store.

use std::future::Future;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

/// File name of the SQLite database inside the cache directory.
pub const CACHE_FILE: &str = "cache.db";

/// SQLite-backed key-value store with per-entry timestamps.
pub struct DiskCache {
    conn: Mutex<Connection>,
}

impl DiskCache {
    /// Open (or create) the cache inside `dir`, creating the directory if
    /// needed.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create cache directory {}", dir.display()))?;
        let path = dir.join(CACHE_FILE);
        let conn = Connection::open(&path)
            .with_context(|| format!("failed to open cache at {}", path.display()))?;
        Self::init(conn)
    }

    /// Ephemeral cache that disappears with the process.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory cache")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;

             CREATE TABLE IF NOT EXISTS cache_entries (
                 namespace TEXT NOT NULL,
                 key       TEXT NOT NULL,
                 value     TEXT NOT NULL,
                 stored_at INTEGER NOT NULL,
                 PRIMARY KEY (namespace, key)
             );",
        )
        .context("failed to create cache schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("cache mutex poisoned"))
    }

    /// Look up a value no older than `ttl`. Returns `None` for a missing or
    /// stale entry.
    pub fn get<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<T>> {
        self.get_at(namespace, key, ttl, Utc::now())
    }

    /// [`DiskCache::get`] evaluated against an explicit clock reading.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<T>> {
        let row: Option<(String, i64)> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT value, stored_at FROM cache_entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("failed to query cache entry")?
        };

        let Some((json, stored_at)) = row else {
            return Ok(None);
        };

        let age_ms = now.timestamp_millis().saturating_sub(stored_at);
        if age_ms > ttl_millis(ttl) {
            debug!(namespace, key, age_ms, "cache entry expired");
            return Ok(None);
        }

        let value = serde_json::from_str(&json)
            .with_context(|| format!("failed to decode cache entry {namespace}/{key}"))?;
        Ok(Some(value))
    }

    /// Store `value` under (namespace, key), replacing any previous entry.
    pub fn put<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        self.put_at(namespace, key, value, Utc::now())
    }

    /// [`DiskCache::put`] with an explicit storage timestamp.
    pub fn put_at<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        stored_at: DateTime<Utc>,
    ) -> Result<()> {
        let json = serde_json::to_string(value).context("failed to encode cache entry")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (namespace, key, value, stored_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![namespace, key, json, stored_at.timestamp_millis()],
        )
        .context("failed to write cache entry")?;
        Ok(())
    }

    /// Delete every entry older than `ttl`. Returns the number removed.
    pub fn purge_expired(&self, ttl: Duration) -> Result<usize> {
        let cutoff = Utc::now()
            .timestamp_millis()
            .saturating_sub(ttl_millis(ttl));
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM cache_entries WHERE stored_at < ?1",
                params![cutoff],
            )
            .context("failed to purge expired cache entries")?;
        Ok(removed)
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))
            .context("failed to count cache entries")?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Cache front used by fetchers: either a working disk cache or a disabled
/// one that always computes.
pub enum ResponseCache {
    Disk(DiskCache),
    Disabled,
}

impl ResponseCache {
    /// Open the disk cache in `dir`, degrading to [`ResponseCache::Disabled`]
    /// when it cannot be opened.
    pub fn open_or_disable(dir: &Path) -> Self {
        match DiskCache::open(dir) {
            Ok(cache) => {
                info!("Response cache opened at {}", dir.display());
                ResponseCache::Disk(cache)
            }
            Err(e) => {
                warn!("Response cache unavailable, fetching without it: {e:#}");
                ResponseCache::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ResponseCache::Disk(_))
    }

    /// Return the cached value for (namespace, key) if it is younger than
    /// `ttl`; otherwise run `compute`, store a successful result, and return
    /// it. Errors from `compute` are passed through and never stored.
    ///
    /// Storage failures are logged and treated as a miss.
    ///
    /// The SQLite lookup and store run inline on the calling task. Callers
    /// fetch one season at a time during startup, so nothing else is waiting
    /// on the runtime thread meanwhile.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let ResponseCache::Disk(cache) = self {
            match cache.get::<T>(namespace, key, ttl) {
                Ok(Some(value)) => {
                    debug!(namespace, key, "cache hit");
                    return Ok(value);
                }
                Ok(None) => debug!(namespace, key, "cache miss"),
                Err(e) => warn!("cache lookup failed for {namespace}/{key}: {e:#}"),
            }
        }

        let value = compute().await?;

        if let ResponseCache::Disk(cache) = self {
            if let Err(e) = cache.put(namespace, key, &value) {
                warn!("cache store failed for {namespace}/{key}: {e:#}");
            }
        }
        Ok(value)
    }
}
