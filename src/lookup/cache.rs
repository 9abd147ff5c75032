//! Time-bounded cache of lookup lists
//!
//! Each list is stored with the instant it was fetched. Reads within the TTL
//! are served from memory; older entries are refetched from the source. The
//! clock is injected so expiry can be driven by tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::metrics;

use super::{LookupError, LookupKind, LookupList, LookupSource};

/// Time source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = chrono::Duration::from_std(by)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
        {
            *now = next;
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<LookupList>,
    fetched_at: DateTime<Utc>,
}

/// Lookup lists cached per kind for a fixed TTL
pub struct LookupCache {
    source: Arc<dyn LookupSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<LookupKind, CacheEntry>>,
}

impl LookupCache {
    pub fn new(source: Arc<dyn LookupSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Built-in tables on the wall clock
    pub fn with_static(ttl: Duration) -> Self {
        Self::new(Arc::new(super::StaticLookups), Arc::new(SystemClock), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached list, refetched when missing or older than the TTL
    pub fn get(&self, kind: LookupKind) -> Result<Arc<LookupList>, LookupError> {
        let now = self.clock.now();

        if let Some(entry) = self.fresh_entry(kind, now) {
            metrics::record_lookup_cache(kind.as_str(), true);
            return Ok(entry);
        }

        metrics::record_lookup_cache(kind.as_str(), false);
        let value = Arc::new(self.source.fetch(kind)?);

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            kind,
            CacheEntry {
                value: Arc::clone(&value),
                fetched_at: now,
            },
        );

        tracing::debug!(list = %kind, options = value.len(), "Lookup list fetched");
        Ok(value)
    }

    /// When the cached copy of `kind` was fetched
    pub fn fetched_at(&self, kind: LookupKind) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&kind).map(|e| e.fetched_at)
    }

    /// Drop one cached list
    pub fn invalidate(&self, kind: LookupKind) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&kind);
    }

    /// Drop every cached list
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    fn fresh_entry(&self, kind: LookupKind, now: DateTime<Utc>) -> Option<Arc<LookupList>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(&kind)?;

        let age = (now - entry.fetched_at).to_std().unwrap_or(Duration::ZERO);
        if age < self.ttl {
            Some(Arc::clone(&entry.value))
        } else {
            None
        }
    }
}
