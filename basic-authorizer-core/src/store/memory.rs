use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;

use crate::digest::secret_digest;
use crate::errors::StoreResult;
use crate::store::{RecordMeta, SecretStore, StoredDigest};

/// Simple in-memory store suitable for embedded usage and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredDigest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, record: StoredDigest) {
        self.records.write().insert(key.into(), record);
    }

    /// Store the digest of `secret` under `key`.
    pub fn insert_secret(
        &self,
        key: impl Into<String>,
        secret: &str,
        expires_at: Option<OffsetDateTime>,
    ) {
        self.insert(key, StoredDigest::new(secret_digest(secret), expires_at));
    }

    pub fn remove(&self, key: &str) -> Option<StoredDigest> {
        self.records.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn describe(&self, key: &str) -> StoreResult<RecordMeta> {
        Ok(self
            .records
            .read()
            .get(key)
            .map(StoredDigest::meta)
            .unwrap_or_else(RecordMeta::missing))
    }

    async fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .records
            .read()
            .get(key)
            .map(|record| record.digest.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[tokio::test]
    async fn describe_and_get() {
        let store = MemoryStore::new();
        let exp = datetime!(2026-05-01 00:00 UTC);
        store.insert_secret("/creds/alice", "secret", Some(exp));

        let meta = store.describe("/creds/alice").await.unwrap();
        assert_eq!(meta, RecordMeta::present(Some(exp)));
        assert_eq!(
            store.get_value("/creds/alice").await.unwrap(),
            Some(secret_digest("secret"))
        );
    }

    #[tokio::test]
    async fn missing_key() {
        let store = MemoryStore::new();
        assert!(!store.describe("/creds/nobody").await.unwrap().exists);
        assert_eq!(store.get_value("/creds/nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_record() {
        let store = MemoryStore::new();
        store.insert_secret("/creds/bob", "pw", None);
        assert_eq!(store.len(), 1);
        store.remove("/creds/bob");
        assert!(store.is_empty());
        assert!(!store.describe("/creds/bob").await.unwrap().exists);
    }
}
