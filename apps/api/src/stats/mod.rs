//! Usage counters and the public stats aggregator.
//!
//! Read-mostly aggregation with a time-bounded cache. The read path never
//! hard-fails: individual metric failures fall back to defaults, a failed
//! recomputation serves the last good snapshot, and with no snapshot at all
//! a static fallback goes out instead of an error.

pub mod handlers;

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use crate::store::Store;

/// Window considered "active today" for the last-login metric.
const ACTIVE_WINDOW_HOURS: i64 = 24;

/// Number of independently-computed metrics in a snapshot.
const METRIC_COUNT: u32 = 5;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_users: i64,
    pub pro_users: i64,
    pub free_users: i64,
    pub active_today: i64,
    pub total_cvs: i64,
    pub total_generations: i64,
}

impl StatsSnapshot {
    /// Static fallback served when nothing has ever been computed.
    pub fn fallback() -> Self {
        Self {
            total_users: 0,
            pro_users: 0,
            free_users: 0,
            active_today: 0,
            total_cvs: 0,
            total_generations: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Stale,
    Fallback,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
            CacheStatus::Fallback => "FALLBACK",
        }
    }
}

struct CachedEntry {
    snapshot: StatsSnapshot,
    computed_at: DateTime<Utc>,
}

/// Time-bounded snapshot cache, constructed once at startup and injected
/// through `AppState`.
pub struct StatsCache {
    ttl: Duration,
    entry: Mutex<Option<CachedEntry>>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Returns the current snapshot and how it was obtained. A fresh cached
    /// entry is served as-is; otherwise the snapshot is recomputed, and a
    /// failed recomputation degrades to the stale entry or the static
    /// fallback rather than an error.
    pub async fn snapshot(
        &self,
        store: &dyn Store,
        now: DateTime<Utc>,
    ) -> (StatsSnapshot, CacheStatus) {
        if let Some(entry) = &*self.entry.lock().unwrap() {
            if now - entry.computed_at < self.ttl {
                return (entry.snapshot.clone(), CacheStatus::Hit);
            }
        }

        match compute_snapshot(store, now).await {
            Ok(snapshot) => {
                *self.entry.lock().unwrap() = Some(CachedEntry {
                    snapshot: snapshot.clone(),
                    computed_at: now,
                });
                (snapshot, CacheStatus::Miss)
            }
            Err(e) => {
                warn!("stats recomputation failed: {e}");
                match &*self.entry.lock().unwrap() {
                    Some(entry) => (entry.snapshot.clone(), CacheStatus::Stale),
                    None => (StatsSnapshot::fallback(), CacheStatus::Fallback),
                }
            }
        }
    }
}

/// Computes a snapshot metric by metric. A single failed metric is logged
/// and defaulted to zero; the computation as a whole only fails when every
/// metric does.
async fn compute_snapshot(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<StatsSnapshot, anyhow::Error> {
    let mut failures = 0u32;
    let mut metric = |name: &str, result: Result<i64, crate::store::StoreError>| match result {
        Ok(v) => v,
        Err(e) => {
            warn!("stats metric '{name}' failed, defaulting to 0: {e}");
            failures += 1;
            0
        }
    };

    let total_users = metric("total_users", store.count_users().await);
    let pro_users = metric("pro_users", store.count_pro_users().await);
    let active_today = metric(
        "active_today",
        store
            .count_active_since(now - Duration::hours(ACTIVE_WINDOW_HOURS))
            .await,
    );
    let total_cvs = metric("total_cvs", store.count_cvs().await);
    let total_generations = metric("total_generations", store.total_generations().await);

    if failures == METRIC_COUNT {
        anyhow::bail!("all {METRIC_COUNT} stats metrics failed");
    }

    Ok(StatsSnapshot {
        total_users,
        pro_users,
        free_users: (total_users - pro_users).max(0),
        active_today,
        total_cvs,
        total_generations,
    })
}
