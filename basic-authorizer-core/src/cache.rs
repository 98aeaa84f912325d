use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Clone, Debug)]
struct CacheValue {
    digest: String,
    expires_at: OffsetDateTime,
}

/// In-memory LRU cache of secret digests keyed by identity.
///
/// Expirations are supplied by the caller (they mirror the secret store's own
/// record expiry); the cache has no TTL policy of its own. Expired entries are
/// dropped on the lookup that finds them.
pub struct DigestCache {
    clock: Arc<dyn Clock>,
    inner: Mutex<LruCache<String, CacheValue>>,
}

impl DigestCache {
    /// Construct a cache holding at most `capacity` identities.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let size = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            clock,
            inner: Mutex::new(LruCache::new(size)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Fetch a digest if present and not yet expired.
    pub fn get(&self, identity: &str) -> Option<String> {
        self.get_at(identity, self.clock.now())
    }

    /// Insert or overwrite the digest for `identity`.
    pub fn put(&self, identity: &str, digest: impl Into<String>, expiration: OffsetDateTime) {
        self.put_at(identity, digest.into(), expiration, self.clock.now());
    }

    /// Drop any digest held for `identity`.
    pub fn invalidate(&self, identity: &str) {
        if self.inner.lock().pop(identity).is_some() {
            debug!(identity, "invalidated cached digest");
        }
    }

    pub fn get_at(&self, identity: &str, now: OffsetDateTime) -> Option<String> {
        let mut inner = self.inner.lock();
        let fresh = match inner.get(identity) {
            Some(value) if now < value.expires_at => Some(value.digest.clone()),
            Some(_) => None,
            None => return None,
        };
        if fresh.is_none() {
            inner.pop(identity);
            debug!(identity, "evicted expired digest");
        }
        fresh
    }

    fn put_at(
        &self,
        identity: &str,
        digest: String,
        expiration: OffsetDateTime,
        now: OffsetDateTime,
    ) {
        if expiration <= now {
            debug!(identity, %expiration, "skipping cache insert for expired record");
            return;
        }
        let entry = CacheValue {
            digest,
            expires_at: expiration,
        };
        self.inner.lock().put(identity.to_string(), entry);
    }
}

impl Default for DigestCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
