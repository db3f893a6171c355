//! Bounded, most-recent-first search history.
//!
//! History is persisted as a single JSON array blob under a well-known key
//! in a [`KeyValueStore`], so the same logic works against browser-style
//! local storage, a JSON file, or memory.
//!
//! ```text
//! search_history = [{"query": "prayer", "timestamp": "2024-12-15T12:00:00Z"}, ...]
//! ```

pub mod memory;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Storage key for the serialized history blob.
pub const HISTORY_KEY: &str = "search_history";

/// Maximum number of remembered queries.
pub const HISTORY_LIMIT: usize = 10;

/// String key-value persistence.
///
/// Implementations must be `Send + Sync` so a store can be shared with
/// async hosts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// One remembered query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    /// RFC 3339 timestamp of the most recent search.
    pub timestamp: String,
}

/// Search history backed by a [`KeyValueStore`].
pub struct SearchHistory<S: KeyValueStore> {
    store: S,
    limit: usize,
}

impl<S: KeyValueStore> SearchHistory<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            limit: HISTORY_LIMIT,
        }
    }

    /// Override the retained entry count, clamped to `1..=HISTORY_LIMIT`.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, HISTORY_LIMIT);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current entries, most recent first. A corrupt blob reads as empty.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let Some(blob) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&blob) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable search history");
                Ok(Vec::new())
            }
        }
    }

    /// Move `query` to the front (adding it if new) and trim to the limit.
    pub fn record(&self, query: &str, now: DateTime<Utc>) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.entries()?;
        entries.retain(|e| e.query != query);
        entries.insert(
            0,
            HistoryEntry {
                query: query.to_string(),
                timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        );
        entries.truncate(self.limit);
        self.save(&entries)?;
        Ok(entries)
    }

    /// Forget one query. Returns the remaining entries.
    pub fn remove(&self, query: &str) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.entries()?;
        entries.retain(|e| e.query != query);
        self.save(&entries)?;
        Ok(entries)
    }

    /// Forget everything.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(HISTORY_KEY)
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        let blob = serde_json::to_string(entries)?;
        self.store.set(HISTORY_KEY, &blob)
    }
}
