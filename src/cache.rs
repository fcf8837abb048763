use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

/// Invalidation signal consumed by whatever caching layer is wired in.
///
/// Callers fire this after a commit, best-effort: an invalidation that goes
/// nowhere (no entry under the tag) is not an error, and failures must never
/// propagate into the primary operation.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, tag: &str);
}

/// Tag for a league's cached leaderboard
pub fn leaderboard_tag(league_id: Uuid) -> String {
    format!("league:{}:leaderboard", league_id)
}

/// Tag for the pick list of a single event
pub fn event_picks_tag(kind: &str, event_id: Uuid) -> String {
    format!("picks:{}:{}", kind, event_id)
}

struct Slot<V> {
    stored_at: Instant,
    value: V,
}

/// In-process TTL cache keyed by invalidation tag.
///
/// Entries expire after the configured TTL and can be dropped early through
/// the `CacheInvalidator` signal. Stale reads within the TTL window are
/// acceptable by the failure model; correctness never depends on this cache.
pub struct TtlCache<V> {
    ttl: Duration,
    slots: RwLock<HashMap<String, Slot<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, dropping it if the TTL has lapsed
    pub fn get(&self, tag: &str) -> Option<V> {
        {
            let slots = self.slots.read().ok()?;
            match slots.get(tag) {
                Some(slot) if slot.stored_at.elapsed() < self.ttl => {
                    return Some(slot.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired entry; evict outside the read lock
        if let Ok(mut slots) = self.slots.write() {
            slots.remove(tag);
        }
        None
    }

    pub fn put(&self, tag: &str, value: V) {
        if let Ok(mut slots) = self.slots.write() {
            slots.insert(
                tag.to_string(),
                Slot {
                    stored_at: Instant::now(),
                    value,
                },
            );
        }
    }
}

impl<V: Clone + Send + Sync> CacheInvalidator for TtlCache<V> {
    fn invalidate(&self, tag: &str) {
        match self.slots.write() {
            Ok(mut slots) => {
                if slots.remove(tag).is_some() {
                    debug!("Cache entry invalidated: {}", tag);
                }
            }
            Err(_) => {
                // Poisoned lock: callers must not be affected, entry will
                // age out via TTL anyway
                debug!("Cache invalidation skipped for {}: poisoned lock", tag);
            }
        }
    }
}

/// Invalidator that only logs the tag; used when no cache is wired in
#[derive(Debug, Default)]
pub struct NullInvalidator;

impl CacheInvalidator for NullInvalidator {
    fn invalidate(&self, tag: &str) {
        debug!("Invalidation tag fired (no cache attached): {}", tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let cache: TtlCache<Vec<i32>> = TtlCache::new(Duration::from_secs(60));
        cache.put("a", vec![1, 2, 3]);
        assert_eq!(cache.get("a"), Some(vec![1, 2, 3]));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_millis(0));
        cache.put("a", 7);
        // Zero TTL expires immediately
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_invalidate_drops_entry() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(60));
        cache.put("a", 7);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        // Invalidating a missing tag is a no-op
        cache.invalidate("a");
    }

    #[test]
    fn test_tag_formats() {
        let id = Uuid::nil();
        assert_eq!(
            leaderboard_tag(id),
            format!("league:{}:leaderboard", Uuid::nil())
        );
        assert_eq!(
            event_picks_tag("match", id),
            format!("picks:match:{}", Uuid::nil())
        );
    }
}
