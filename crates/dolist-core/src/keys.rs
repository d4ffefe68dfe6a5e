//! API key collection for `dolist-sync`.
//!
//! An API key is both the credential and the identity of a user. Valid keys
//! live in a single ordered collection; the file backend persists it as a
//! pretty-printed JSON array of strings.
//!
//! # Consistency
//!
//! [`FileKeyStore::contains`] re-reads the file on every call, so keys added
//! by an operator editing the file are visible on the next request. Appends
//! are a full read-modify-write of the file. Within one process they are
//! serialized by a `tokio::sync::Mutex`, so two concurrent mint calls never
//! drop each other's key. Each rewrite goes to a sibling `.tmp` file that is
//! then renamed over the key file, so a concurrent reader sees either the old
//! or the new collection, never a truncated one. Separate processes sharing
//! one file are not coordinated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::RngCore;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::KeyStoreError;

/// Number of random bytes in a generated API key (hex-encoded to 32 chars).
pub const API_KEY_BYTES: usize = 16;

/// A persisted collection of valid API keys.
///
/// Implementations must be safe to share across async tasks.
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync + 'static {
    /// Whether `key` is an exact member of the collection.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError`] if the collection cannot be loaded.
    async fn contains(&self, key: &str) -> Result<bool, KeyStoreError>;

    /// Append `key` to the end of the collection and persist it.
    ///
    /// Uniqueness is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError`] if the collection cannot be loaded or saved.
    async fn append(&self, key: &str) -> Result<(), KeyStoreError>;

    /// Number of keys in the collection.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError`] if the collection cannot be loaded.
    async fn count(&self) -> Result<usize, KeyStoreError>;
}

/// Generate a fresh API key: 16 bytes from the thread-local CSPRNG, hex-encoded.
#[must_use]
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a new key, append it to `store`, and return it.
///
/// # Errors
///
/// Returns [`KeyStoreError`] if the key could not be persisted.
pub async fn mint_api_key(store: &dyn KeyStore) -> Result<String, KeyStoreError> {
    let key = generate_api_key();
    store.append(&key).await?;
    info!("API key minted");
    Ok(key)
}

/// Key store backed by a JSON array file.
pub struct FileKeyStore {
    path: PathBuf,
    /// Serializes read-modify-write appends.
    append_lock: Mutex<()>,
}

impl FileKeyStore {
    /// Open a key store at `path` without touching the filesystem.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            append_lock: Mutex::new(()),
        }
    }

    /// Open a key store at `path`, creating the file with an empty array
    /// (and its parent directories) if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Write`] if the file or its directory cannot
    /// be created.
    pub async fn initialize(path: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let store = Self::new(path);

        let exists = tokio::fs::try_exists(&store.path)
            .await
            .map_err(|e| store.read_error(&e))?;
        if !exists {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| store.write_error(&e))?;
            }
            store.save(&[]).await?;
            info!(path = %store.path.display(), "created empty API key file");
        }

        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<String>, KeyStoreError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.read_error(&e))?;

        serde_json::from_slice(&raw).map_err(|e| KeyStoreError::Parse {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, keys: &[String]) -> Result<(), KeyStoreError> {
        let bytes = serde_json::to_vec_pretty(keys).map_err(|e| KeyStoreError::Write {
            path: self.path.display().to_string(),
            reason: format!("serialization failed: {e}"),
        })?;

        let staging = self.staging_path();
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| self.write_error(&e))?;

        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| self.write_error(&e))
    }

    /// Sibling file a rewrite is staged in before the rename.
    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    fn read_error(&self, err: &std::io::Error) -> KeyStoreError {
        KeyStoreError::Read {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }

    fn write_error(&self, err: &std::io::Error) -> KeyStoreError {
        KeyStoreError::Write {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl KeyStore for FileKeyStore {
    async fn contains(&self, key: &str) -> Result<bool, KeyStoreError> {
        let keys = self.load().await?;
        Ok(keys.iter().any(|k| k == key))
    }

    async fn append(&self, key: &str) -> Result<(), KeyStoreError> {
        let _guard = self.append_lock.lock().await;

        let mut keys = self.load().await?;
        keys.push(key.to_owned());
        self.save(&keys).await?;

        debug!(total = keys.len(), "API key file rewritten");
        Ok(())
    }

    async fn count(&self) -> Result<usize, KeyStoreError> {
        Ok(self.load().await?.len())
    }
}

impl std::fmt::Debug for FileKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// In-memory key store, for tests.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    keys: Arc<RwLock<Vec<String>>>,
}

impl MemoryKeyStore {
    /// Create a store seeded with `keys`.
    #[must_use]
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: Arc::new(RwLock::new(keys.into_iter().map(Into::into).collect())),
        }
    }
}

#[async_trait::async_trait]
impl KeyStore for MemoryKeyStore {
    async fn contains(&self, key: &str) -> Result<bool, KeyStoreError> {
        Ok(self.keys.read().await.iter().any(|k| k == key))
    }

    async fn append(&self, key: &str) -> Result<(), KeyStoreError> {
        self.keys.write().await.push(key.to_owned());
        Ok(())
    }

    async fn count(&self) -> Result<usize, KeyStoreError> {
        Ok(self.keys.read().await.len())
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKeyStore").finish_non_exhaustive()
    }
}
