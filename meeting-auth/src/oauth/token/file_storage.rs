//! JSON-file credential storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::encryption::Cipher;
use super::{Credential, Storage, StoredCredential};
use crate::error::{storage_error, Error, ErrorKind, StorageErrorKind};

/// One entry of the credential file: sealed when a key is configured.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Entry {
    Sealed(String),
    Plain(StoredCredential),
}

/// Credential storage backed by a single JSON file keyed by `account:provider`.
///
/// Writes go to a sibling temp file that is renamed over the original, and all
/// access is serialized through an async mutex.
pub struct FileStorage {
    path: PathBuf,
    cipher: Option<Cipher>,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create a file storage, sealing entries with `encryption_key` (hex) if given.
    pub fn new(path: impl Into<PathBuf>, encryption_key: Option<&str>) -> Result<Self, Error> {
        let cipher = encryption_key.map(Cipher::from_hex).transpose()?;
        Ok(Self {
            path: path.into(),
            cipher,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key(account_id: &str, provider_id: &str) -> String {
        format!("{}:{}", account_id, provider_id)
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Entry>, Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Storage(StorageErrorKind::Serialization),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, Entry>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let text = serde_json::to_string_pretty(entries).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::Serialization),
        })?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_error)
    }

    fn encode(&self, credential: &Credential) -> Result<Entry, Error> {
        let stored = StoredCredential::from(credential);
        match &self.cipher {
            Some(cipher) => {
                let json = serde_json::to_string(&stored).map_err(|e| Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::Storage(StorageErrorKind::Serialization),
                })?;
                Ok(Entry::Sealed(cipher.seal(&json)?))
            }
            None => Ok(Entry::Plain(stored)),
        }
    }

    fn decode(&self, entry: Entry) -> Result<Credential, Error> {
        let stored = match entry {
            Entry::Plain(stored) => stored,
            Entry::Sealed(sealed) => {
                let cipher = self.cipher.as_ref().ok_or_else(|| {
                    storage_error(
                        StorageErrorKind::DecryptionFailed,
                        "Credential is encrypted but no encryption key is configured",
                    )
                })?;
                serde_json::from_str(&cipher.open(&sealed)?).map_err(|e| Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::Storage(StorageErrorKind::Serialization),
                })?
            }
        };
        Ok(stored.into())
    }
}

fn io_error(err: std::io::Error) -> Error {
    Error {
        source: Some(Box::new(err)),
        error_kind: ErrorKind::Storage(StorageErrorKind::Io),
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn store(
        &self,
        account_id: &str,
        provider_id: &str,
        credential: Credential,
    ) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(
            Self::key(account_id, provider_id),
            self.encode(&credential)?,
        );
        self.write_all(&entries).await?;
        debug!("Stored credential for {}", Self::key(account_id, provider_id));
        Ok(())
    }

    async fn get(&self, account_id: &str, provider_id: &str) -> Result<Option<Credential>, Error> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries
            .remove(&Self::key(account_id, provider_id))
            .map(|entry| self.decode(entry))
            .transpose()
    }

    async fn delete(&self, account_id: &str, provider_id: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(&Self::key(account_id, provider_id)).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}
