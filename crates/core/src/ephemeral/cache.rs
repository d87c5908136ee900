//! Ephemeral token cache
//!
//! Holds the full token set obtained at callback time for users who asked
//! for ephemeral delivery. Each entry is handed out exactly once, and
//! entries left unclaimed past the configured TTL count as absent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use authbridge_common::auth::TokenSet;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug)]
struct CachedTokens {
    tokens: TokenSet,
    stored_at: Instant,
}

/// `user_id → TokenSet`, consumed on first read.
#[derive(Debug, Default)]
pub struct EphemeralTokenCache {
    entries: Mutex<HashMap<String, CachedTokens>>,
    ttl: Option<Duration>,
}

impl EphemeralTokenCache {
    /// Cache whose entries expire after `ttl`. A zero TTL disables expiry.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl: (!ttl.is_zero()).then_some(ttl) }
    }

    /// Cache whose entries live until taken.
    #[must_use]
    pub fn without_expiry() -> Self {
        Self::default()
    }

    /// Store `tokens` for `user_id`, replacing any unconsumed entry.
    ///
    /// Returns `true` when a live earlier entry was overwritten.
    pub fn put(&self, user_id: &str, tokens: TokenSet) -> bool {
        self.put_at(user_id, tokens, Instant::now())
    }

    /// Remove and return the entry for `user_id` unless it has expired.
    pub fn take(&self, user_id: &str) -> Option<TokenSet> {
        self.take_at(user_id, Instant::now())
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|entry| !self.is_expired(entry, now)).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put_at(&self, user_id: &str, tokens: TokenSet, now: Instant) -> bool {
        let entry = CachedTokens { tokens, stored_at: now };
        let previous = self.entries.lock().insert(user_id.to_string(), entry);
        previous.is_some_and(|entry| !self.is_expired(&entry, now))
    }

    fn take_at(&self, user_id: &str, now: Instant) -> Option<TokenSet> {
        let entry = self.entries.lock().remove(user_id)?;
        if self.is_expired(&entry, now) {
            debug!(user_id, "ephemeral tokens expired before pickup");
            return None;
        }
        Some(entry.tokens)
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    fn is_expired(&self, entry: &CachedTokens, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| now.saturating_duration_since(entry.stored_at) >= ttl)
    }

    #[cfg(test)]
    fn stored_count(&self) -> usize {
        self.entries.lock().len()
    }
}
