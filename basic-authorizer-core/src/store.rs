//! Secret store seam.
//!
//! The store exposes record metadata (existence and expiry) and the stored
//! digest through two separate calls, mirroring parameter-store style APIs
//! where a describe query and a value fetch are distinct requests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::StoreResult;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Result of a describe-style lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub exists: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expiration: Option<OffsetDateTime>,
}

impl RecordMeta {
    pub fn missing() -> Self {
        Self {
            exists: false,
            expiration: None,
        }
    }

    pub fn present(expiration: Option<OffsetDateTime>) -> Self {
        Self {
            exists: true,
            expiration,
        }
    }
}

/// A digest as held by a store, with the record's own expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDigest {
    pub digest: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl StoredDigest {
    pub fn new(digest: impl Into<String>, expires_at: Option<OffsetDateTime>) -> Self {
        Self {
            digest: digest.into(),
            expires_at,
        }
    }

    pub fn meta(&self) -> RecordMeta {
        RecordMeta::present(self.expires_at)
    }
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Report whether `key` exists and when it expires.
    async fn describe(&self, key: &str) -> StoreResult<RecordMeta>;

    /// Fetch the stored digest for `key`.
    async fn get_value(&self, key: &str) -> StoreResult<Option<String>>;
}

#[async_trait]
impl<T> SecretStore for Box<T>
where
    T: SecretStore + ?Sized,
{
    async fn describe(&self, key: &str) -> StoreResult<RecordMeta> {
        (**self).describe(key).await
    }

    async fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_value(key).await
    }
}

#[async_trait]
impl<T> SecretStore for Arc<T>
where
    T: SecretStore + ?Sized,
{
    async fn describe(&self, key: &str) -> StoreResult<RecordMeta> {
        (**self).describe(key).await
    }

    async fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_value(key).await
    }
}
