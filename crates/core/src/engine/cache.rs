//! Single-slot response cache with a freshness window.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::ResponseData;

/// One committed pipeline result.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub payload: ResponseData,
    pub captured_at: DateTime<Utc>,
    /// Incremented on every store; lets waiters detect a refresh that
    /// completed after they arrived.
    pub generation: u64,
}

impl CachedSnapshot {
    /// Whole seconds since capture; zero if the clock went backwards.
    pub fn age_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.captured_at).num_seconds().max(0) as u64
    }
}

/// Holds the latest snapshot.
///
/// Snapshots are swapped as a whole behind an `Arc`, so readers always see a
/// complete payload.
#[derive(Debug)]
pub struct CacheGate {
    ttl: Duration,
    slot: RwLock<Option<Arc<CachedSnapshot>>>,
}

impl CacheGate {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            slot: RwLock::new(None),
        }
    }

    /// Age of `snapshot` if it is still inside the freshness window.
    pub fn fresh_age(&self, snapshot: &CachedSnapshot, now: DateTime<Utc>) -> Option<u64> {
        (now - snapshot.captured_at < self.ttl).then(|| snapshot.age_secs(now))
    }

    /// The latest snapshot regardless of age.
    pub async fn snapshot(&self) -> Option<Arc<CachedSnapshot>> {
        self.slot.read().await.clone()
    }

    /// Replace the snapshot.
    pub async fn store(
        &self,
        payload: ResponseData,
        captured_at: DateTime<Utc>,
    ) -> Arc<CachedSnapshot> {
        let mut slot = self.slot.write().await;
        let generation = slot.as_ref().map(|s| s.generation + 1).unwrap_or(1);
        let snapshot = Arc::new(CachedSnapshot {
            payload,
            captured_at,
            generation,
        });
        *slot = Some(snapshot.clone());
        snapshot
    }

    /// Age of the snapshot in whole seconds, fresh or not.
    pub async fn age(&self, now: DateTime<Utc>) -> Option<u64> {
        self.slot.read().await.as_ref().map(|s| s.age_secs(now))
    }
}
