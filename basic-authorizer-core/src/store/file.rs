use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::store::{RecordMeta, SecretStore, StoredDigest};

/// On-disk document layout read by [`FileStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsFile {
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub key: String,
    #[serde(flatten)]
    pub record: StoredDigest,
}

impl CredentialsFile {
    fn into_map(self) -> HashMap<String, StoredDigest> {
        self.credentials
            .into_iter()
            .map(|entry| (entry.key, entry.record))
            .collect()
    }
}

/// Filesystem-backed store reading a JSON credentials document.
///
/// The file is re-read on every call so edits are picked up without a
/// restart; the digest cache in front of it absorbs the cost.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> StoreResult<HashMap<String, StoredDigest>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            let reason = match err.kind() {
                ErrorKind::NotFound => format!("{} does not exist", self.path.display()),
                _ => format!("{}: {err}", self.path.display()),
            };
            StoreError::Unreachable(reason)
        })?;
        let document: CredentialsFile =
            serde_json::from_slice(&bytes).map_err(|err| StoreError::InvalidRecord {
                key: self.path.display().to_string(),
                reason: err.to_string(),
            })?;
        debug!(
            path = %self.path.display(),
            records = document.credentials.len(),
            "loaded credentials file"
        );
        Ok(document.into_map())
    }
}

#[async_trait]
impl SecretStore for FileStore {
    async fn describe(&self, key: &str) -> StoreResult<RecordMeta> {
        let records = self.load().await?;
        Ok(records
            .get(key)
            .map(StoredDigest::meta)
            .unwrap_or_else(RecordMeta::missing))
    }

    async fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        let mut records = self.load().await?;
        Ok(records.remove(key).map(|record| record.digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use time::macros::datetime;

    #[tokio::test]
    async fn reads_records_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let document = json!({
            "credentials": [
                {
                    "key": "/creds/alice_AT_x.com",
                    "digest": "abc123",
                    "expires_at": "2026-05-13T00:00:00.000Z"
                },
                { "key": "/creds/bob", "digest": "def456" }
            ]
        });
        std::fs::write(&path, document.to_string()).unwrap();

        let store = FileStore::new(&path);
        let meta = store.describe("/creds/alice_AT_x.com").await.unwrap();
        assert_eq!(
            meta,
            RecordMeta::present(Some(datetime!(2026-05-13 00:00 UTC)))
        );
        assert_eq!(
            store.get_value("/creds/alice_AT_x.com").await.unwrap(),
            Some("abc123".to_string())
        );
        assert_eq!(
            store.describe("/creds/bob").await.unwrap(),
            RecordMeta::present(None)
        );
        assert!(!store.describe("/creds/carol").await.unwrap().exists);
    }

    #[tokio::test]
    async fn missing_file_is_unreachable() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        let err = store.describe("/creds/alice").await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
    }

    #[tokio::test]
    async fn malformed_document_is_invalid_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FileStore::new(&path).get_value("k").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
    }
}
