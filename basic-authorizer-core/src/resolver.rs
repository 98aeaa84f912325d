use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::cache::{DEFAULT_CACHE_CAPACITY, DigestCache};
use crate::clock::{Clock, SystemClock};
use crate::errors::{Result, StoreError, StoreResult};
use crate::identity::{DEFAULT_KEY_PREFIX, KeyScheme};
use crate::store::{RecordMeta, SecretStore};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

const KEY_PREFIX_ENV: &str = "BASIC_AUTHORIZER_KEY_PREFIX";
const CACHE_CAPACITY_ENV: &str = "BASIC_AUTHORIZER_CACHE_CAPACITY";
const STORE_TIMEOUT_ENV: &str = "BASIC_AUTHORIZER_STORE_TIMEOUT_MS";
const FALLBACK_TTL_ENV: &str = "BASIC_AUTHORIZER_FALLBACK_TTL_SECS";

/// Settings for [`SecretResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    key_prefix: String,
    cache_capacity: usize,
    store_timeout: Duration,
    fallback_ttl: Option<Duration>,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            fallback_ttl: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// * `BASIC_AUTHORIZER_KEY_PREFIX` prefixes every store key.
    /// * `BASIC_AUTHORIZER_CACHE_CAPACITY` bounds the number of cached identities.
    /// * `BASIC_AUTHORIZER_STORE_TIMEOUT_MS` bounds each store call.
    /// * `BASIC_AUTHORIZER_FALLBACK_TTL_SECS` caches records that carry no
    ///   expiration of their own (unset: such records are never cached).
    pub fn from_env() -> Self {
        let mut config = ResolverConfig::new();

        if let Ok(prefix) = std::env::var(KEY_PREFIX_ENV)
            && !prefix.trim().is_empty()
        {
            config.key_prefix = prefix.trim().to_string();
        }

        if let Some(capacity) = env_number(CACHE_CAPACITY_ENV) {
            config.cache_capacity = (capacity as usize).max(1);
        }

        if let Some(millis) = env_number(STORE_TIMEOUT_ENV) {
            config.store_timeout = Duration::from_millis(millis.max(1));
        }

        if let Some(seconds) = env_number(FALLBACK_TTL_ENV) {
            config.fallback_ttl = (seconds > 0).then(|| Duration::from_secs(seconds));
        }

        config
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn fallback_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn capacity(&self) -> usize {
        self.cache_capacity
    }

    pub fn timeout(&self) -> Duration {
        self.store_timeout
    }

    pub fn ttl_without_expiration(&self) -> Option<Duration> {
        self.fallback_ttl
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig::new()
    }
}

fn env_number(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.trim().parse::<u64>().ok()
}

/// Read-through lookup of expected secret digests.
///
/// Concurrent misses for the same identity may each reach the store; the
/// resulting cache writes are idempotent overwrites.
pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
    cache: DigestCache,
    keys: KeyScheme,
    store_timeout: Duration,
    fallback_ttl: Option<Duration>,
}

impl SecretResolver {
    pub fn new<S>(store: S, config: ResolverConfig) -> Self
    where
        S: SecretStore + 'static,
    {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock<S>(store: S, config: ResolverConfig, clock: Arc<dyn Clock>) -> Self
    where
        S: SecretStore + 'static,
    {
        Self {
            store: Arc::new(store),
            cache: DigestCache::with_clock(config.cache_capacity, clock),
            keys: KeyScheme::new(config.key_prefix),
            store_timeout: config.store_timeout,
            fallback_ttl: config.fallback_ttl,
        }
    }

    pub fn cache(&self) -> &DigestCache {
        &self.cache
    }

    pub fn key_scheme(&self) -> &KeyScheme {
        &self.keys
    }

    /// Resolve the stored digest for `identity`.
    ///
    /// `Ok(None)` means the store has no record for the identity. Store faults
    /// and timeouts surface as [`Error::StoreUnavailable`](crate::Error).
    pub async fn resolve(&self, identity: &str) -> Result<Option<String>> {
        if let Some(digest) = self.cache.get(identity) {
            debug!(identity, "digest cache hit");
            return Ok(Some(digest));
        }

        let key = self.keys.store_key(identity);
        let meta = self.call(&key, self.store.describe(&key)).await?;
        if !meta.exists {
            info!(key = %key, "credential record does not exist");
            self.cache.invalidate(identity);
            return Ok(None);
        }

        let Some(digest) = self.call(&key, self.store.get_value(&key)).await? else {
            info!(key = %key, "credential record disappeared between describe and fetch");
            self.cache.invalidate(identity);
            return Ok(None);
        };

        match self.expiration(&meta) {
            Some(expiration) => {
                debug!(key = %key, %expiration, "caching resolved digest");
                self.cache.put(identity, digest.clone(), expiration);
            }
            None => debug!(key = %key, "record has no expiration; not cached"),
        }

        Ok(Some(digest))
    }

    fn expiration(&self, meta: &RecordMeta) -> Option<OffsetDateTime> {
        if let Some(expiration) = meta.expiration {
            return Some(expiration);
        }
        let ttl = time::Duration::try_from(self.fallback_ttl?).ok()?;
        self.cache.now().checked_add(ttl)
    }

    async fn call<T, F>(&self, key: &str, fut: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(key, error = %err, "secret store call failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(key, timeout = ?self.store_timeout, "secret store call timed out");
                Err(StoreError::Timeout(self.store_timeout).into())
            }
        }
    }
}
