use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use authorizer_core::store::file::CredentialsFile;
use authorizer_core::{FileStore, MemoryStore, ResolverConfig, SecretStore};
use tracing::{info, warn};

pub const STORE_ENV: &str = "BASIC_AUTHORIZER_STORE";
pub const STORE_PATH_ENV: &str = "BASIC_AUTHORIZER_STORE_PATH";
pub const DEFAULT_STORE_PATH: &str = "credentials.json";

/// Where credential digests are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// Snapshot of a credentials file taken once at startup.
    Memory(PathBuf),
    /// Credentials file re-read on every store call.
    File(PathBuf),
}

impl StoreKind {
    pub fn path(&self) -> &Path {
        match self {
            StoreKind::Memory(path) | StoreKind::File(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizerSettings {
    pub resolver: ResolverConfig,
    pub store: StoreKind,
}

impl AuthorizerSettings {
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(STORE_PATH_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        let kind = std::env::var(STORE_ENV).unwrap_or_else(|_| "file".into());
        let store = match kind.trim().to_ascii_lowercase().as_str() {
            "file" => StoreKind::File(path),
            "memory" => StoreKind::Memory(path),
            other => return Err(anyhow!("unsupported store `{other}`")),
        };
        Ok(Self {
            resolver: ResolverConfig::from_env(),
            store,
        })
    }
}

pub async fn load_store(kind: &StoreKind) -> Result<Box<dyn SecretStore>> {
    match kind {
        StoreKind::File(path) => {
            if !path.exists() {
                warn!(
                    path = %path.display(),
                    "credentials file not found; store calls fail until it exists"
                );
            }
            info!(path = %path.display(), "using file store");
            Ok(Box::new(FileStore::new(path.clone())))
        }
        StoreKind::Memory(path) => {
            let store = memory_snapshot(path).await?;
            info!(path = %path.display(), records = store.len(), "using memory store");
            Ok(Box::new(store))
        }
    }
}

async fn memory_snapshot(path: &Path) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(
                path = %path.display(),
                "credentials file not found; memory store starts empty"
            );
            return Ok(store);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let document: CredentialsFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid credentials file {}", path.display()))?;
    for entry in document.credentials {
        store.insert(entry.key, entry.record);
    }
    Ok(store)
}
