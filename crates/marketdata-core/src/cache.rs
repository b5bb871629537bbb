//! Time-bounded memoization of the expensive pair-listing call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::PairListing;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Per-adapter-instance cache of full pair listings, keyed by market type.
///
/// At most one entry exists per market type. Entries older than the TTL are
/// treated as absent; expiration is lazy, a stale entry is simply
/// overwritten by the next live fetch. The cache is exclusively owned by one
/// adapter instance and is not shared across instances or processes.
#[derive(Debug)]
pub struct PairCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, PairListing)>>,
}

impl PairCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `market_type`, if any.
    pub fn get(&self, market_type: &str) -> Option<PairListing> {
        self.get_at(market_type, Instant::now())
    }

    /// Freshness evaluated against an explicit clock; `get` wraps this with
    /// `Instant::now()`.
    pub fn get_at(&self, market_type: &str, now: Instant) -> Option<PairListing> {
        let entries = self.lock_entries();
        let (captured, listing) = entries.get(market_type)?;
        if now.duration_since(*captured) < self.ttl {
            Some(listing.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, market_type: &str, listing: PairListing) {
        self.insert_at(market_type, listing, Instant::now());
    }

    pub fn insert_at(&self, market_type: &str, listing: PairListing, now: Instant) {
        self.lock_entries()
            .insert(market_type.to_string(), (now, listing));
    }

    fn lock_entries(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, (Instant, PairListing)>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for PairCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
