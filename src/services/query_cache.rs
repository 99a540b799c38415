use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::services::calendar::CalendarMode;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Monotonic time source.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Identity of a calendar query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub mode: CalendarMode,
    /// `YYYY-MM` of the reference date.
    pub year_month: String,
    pub event_type: Option<String>,
    pub sort: String,
}

impl CacheKey {
    pub fn new(
        mode: CalendarMode,
        reference: DateTime<Utc>,
        event_type: Option<&str>,
        sort: &str,
    ) -> Self {
        CacheKey {
            mode,
            year_month: format!("{:04}-{:02}", reference.year(), reference.month()),
            event_type: event_type.map(str::to_string).filter(|t| !t.is_empty()),
            sort: sort.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.mode.as_str(),
            self.sort,
            self.event_type.as_deref().unwrap_or(""),
            self.year_month
        )
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Time-bounded snapshot cache keyed by query identity. Unbounded; entries
/// only leave through expiry or `clear`.
pub struct QueryCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<CacheKey, Entry<V>>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        QueryCache {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored snapshot if it is younger than the TTL.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if self.clock.now().saturating_duration_since(entry.stored_at) < self.ttl {
            debug!("Query cache hit for {}", key);
            Some(entry.value.clone())
        } else {
            debug!("Query cache entry for {} expired", key);
            None
        }
    }

    pub async fn insert(&self, key: CacheKey, value: V) {
        let stored_at = self.clock.now();
        self.entries
            .write()
            .await
            .insert(key, Entry { value, stored_at });
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            debug!("Clearing {} cached queries", entries.len());
        }
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Manually advanced clock.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    start: Instant,
    offset: std::sync::Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        ManualClock {
            start: Instant::now(),
            offset: std::sync::Mutex::new(Duration::ZERO),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap();
        *offset += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }
}
