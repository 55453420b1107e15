//! TTL-keyed schema store.

use super::clock::{Clock, SystemClock};
use super::document::SchemaDocument;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Default time a fetched schema stays fresh.
pub const DEFAULT_SCHEMA_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct CacheEntry {
    schema: Arc<SchemaDocument>,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Counters for cache activity since construction or the last
/// [`SchemaCache::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired_evictions: u64,
    pub fetches: u64,
}

/// Process-wide schema cache, shared across compilations.
///
/// Entries expire `ttl` after they were fetched and are evicted lazily on the
/// next lookup; nothing sweeps the map in the background. Concurrent misses on
/// the same URL may both fetch; the last insert wins.
#[derive(Debug)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired_evictions: AtomicU64,
    fetches: AtomicU64,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    /// A cache with the default one-hour TTL and the system clock.
    pub fn new() -> Self {
        Self::with_clock(Duration::seconds(DEFAULT_SCHEMA_TTL_SECS), Arc::new(SystemClock))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired_evictions: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a schema, evicting it first if it has expired.
    pub fn get(&self, url: &str) -> Option<Arc<SchemaDocument>> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(url) {
                Some(entry) if now < entry.expires_at => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(url, fetched_at = %entry.fetched_at, "schema cache hit");
                    return Some(Arc::clone(&entry.schema));
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(url, "schema cache miss");
                    return None;
                }
            }
        }

        // Expired. Another thread may have refreshed it since the read lock
        // was released, so re-check under the write lock.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(url) {
            if now < entry.expires_at {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Arc::clone(&entry.schema));
            }
            entries.remove(url);
            self.expired_evictions.fetch_add(1, Ordering::Relaxed);
            debug!(url, "evicted expired schema");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a freshly fetched schema.
    pub fn insert(&self, url: impl Into<String>, schema: Arc<SchemaDocument>) {
        let fetched_at = self.clock.now();
        let entry = CacheEntry {
            schema,
            fetched_at,
            expires_at: fetched_at + self.ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), entry);
    }

    pub(crate) fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        for counter in [
            &self.hits,
            &self.misses,
            &self.expired_evictions,
            &self.fetches,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_evictions: self.expired_evictions.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }
}
