//! Cache en mémoire des URLs de streaming résolues
//!
//! Resolved URLs are time-limited on the upstream side, so every entry carries
//! its own expiry. Expired entries are never swept: [`ResolutionCache::get`]
//! treats them as absent and the next successful resolution overwrites them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default lifetime of a resolved URL (1 hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A resolved URL and the instant it stops being usable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub identifier: String,
    pub resolved_url: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(identifier: impl Into<String>, resolved_url: impl Into<String>, ttl: Duration) -> Self {
        let now = Instant::now();
        // Un TTL démesuré ne doit pas faire paniquer l'addition
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64));
        Self {
            identifier: identifier.into(),
            resolved_url: resolved_url.into(),
            expires_at,
        }
    }

    /// Usable only while `now` is strictly before the expiry
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Concurrent identifier → resolved URL store
///
/// All reads and writes go through a single mutex, and entries are replaced
/// whole, so a reader sees either the previous entry or the new one.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached URL if present and not expired
    pub fn get(&self, identifier: &str) -> Option<String> {
        let now = Instant::now();
        self.entries()
            .get(identifier)
            .filter(|entry| entry.is_fresh_at(now))
            .map(|entry| entry.resolved_url.clone())
    }

    /// Inserts or replaces the entry for `identifier`, expiring after `ttl`
    pub fn put(&self, identifier: &str, url: &str, ttl: Duration) {
        let entry = CacheEntry::new(identifier, url, ttl);
        self.entries().insert(identifier.to_string(), entry);
    }

    /// Raw entry lookup, stale or not
    pub fn entry(&self, identifier: &str) -> Option<CacheEntry> {
        self.entries().get(identifier).cloned()
    }

    /// Number of stored entries, including expired ones
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
