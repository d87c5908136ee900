//! Process-wide challenge registry
//!
//! Maps `user_id → challenge → platform`. A challenge is registered when a
//! client starts a flow and consumed at most once when the client later asks
//! for a token. Entries older than the configured TTL count as absent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use authbridge_domain::Platform;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct ChallengeEntry {
    platform: Platform,
    registered_at: Instant,
}

type Buckets = HashMap<String, HashMap<String, ChallengeEntry>>;

/// In-memory registry of outstanding challenges.
///
/// All operations hold the internal lock only for the map access itself.
#[derive(Debug, Default)]
pub struct ChallengeRegistry {
    buckets: Mutex<Buckets>,
    ttl: Option<Duration>,
}

impl ChallengeRegistry {
    /// Registry whose entries expire after `ttl`. A zero TTL disables expiry.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { buckets: Mutex::new(HashMap::new()), ttl: (!ttl.is_zero()).then_some(ttl) }
    }

    /// Registry whose entries live until consumed.
    #[must_use]
    pub fn without_expiry() -> Self {
        Self::default()
    }

    /// Register `challenge` for `user_id`. Re-registering the same pair
    /// overwrites its platform and restarts its lifetime.
    pub fn register(&self, user_id: &str, challenge: &str, platform: Platform) {
        self.register_at(user_id, challenge, platform, Instant::now());
    }

    /// Remove and return the platform tagged on `(user_id, challenge)`.
    ///
    /// Returns `None` when the pair was never registered, was already
    /// consumed, or has expired.
    pub fn consume(&self, user_id: &str, challenge: &str) -> Option<Platform> {
        self.consume_at(user_id, challenge, Instant::now())
    }

    /// Drop every expired entry and any bucket left empty.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Number of live challenges across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let buckets = self.buckets.lock();
        buckets
            .values()
            .flat_map(HashMap::values)
            .filter(|entry| !self.is_expired(entry, now))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register_at(&self, user_id: &str, challenge: &str, platform: Platform, now: Instant) {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(user_id.to_string()).or_default();
        if let Some(ttl) = self.ttl {
            bucket.retain(|_, entry| now.saturating_duration_since(entry.registered_at) < ttl);
        }
        bucket.insert(challenge.to_string(), ChallengeEntry { platform, registered_at: now });
    }

    fn consume_at(&self, user_id: &str, challenge: &str, now: Instant) -> Option<Platform> {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.get_mut(user_id)?;
        let entry = bucket.remove(challenge);
        if let Some(ttl) = self.ttl {
            bucket.retain(|_, entry| now.saturating_duration_since(entry.registered_at) < ttl);
        }
        if bucket.is_empty() {
            buckets.remove(user_id);
        }

        let entry = entry?;
        if self.is_expired(&entry, now) {
            debug!(user_id, "challenge expired before use");
            return None;
        }
        Some(entry.platform)
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut removed = 0;
        let mut buckets = self.buckets.lock();
        buckets.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|_, entry| !self.is_expired(entry, now));
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        removed
    }

    fn is_expired(&self, entry: &ChallengeEntry, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| now.saturating_duration_since(entry.registered_at) >= ttl)
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.lock().len()
    }
}
