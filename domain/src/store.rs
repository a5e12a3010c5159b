//! Opaque keyed persistence for finished job results.

use crate::error::Error;
use async_trait::async_trait;
use log::*;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Upsert/delete by id into one logical table per pipeline kind.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn upsert(&self, table: &str, id: &str, value: Value) -> Result<(), Error>;

    /// Returns `false` when the id was not present.
    async fn delete(&self, table: &str, id: &str) -> Result<bool, Error>;

    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, Error>;
}

/// One pretty-printed JSON object per table (`<dir>/<table>.json`), rewritten
/// through a temp file on every change.
pub struct JsonFileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    fn table_path(&self, table: &str) -> Result<PathBuf, Error> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::validation(format!("invalid table name '{}'", table)));
        }
        Ok(self.dir.join(format!("{}.json", table)))
    }

    async fn read_table(&self, table: &str) -> Result<Map<String, Value>, Error> {
        let path = self.table_path(table)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Ok(Map::new()),
            Ok(text) => serde_json::from_str(&text).map_err(Error::persistence),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(Error::persistence(e)),
        }
    }

    async fn write_table(&self, table: &str, rows: &Map<String, Value>) -> Result<(), Error> {
        let path = self.table_path(table)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(Error::persistence)?;
        let text = serde_json::to_string_pretty(rows).map_err(Error::persistence)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text)
            .await
            .map_err(Error::persistence)?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(Error::persistence)
    }
}

#[async_trait]
impl ArtifactStore for JsonFileStore {
    async fn upsert(&self, table: &str, id: &str, value: Value) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_table(table).await?;
        rows.insert(id.to_string(), value);
        self.write_table(table, &rows).await?;
        debug!("Saved {} into {}", id, table);
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<bool, Error> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_table(table).await?;
        if rows.remove(id).is_none() {
            return Ok(false);
        }
        self.write_table(table, &rows).await?;
        debug!("Deleted {} from {}", id, table);
        Ok(true)
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, Error> {
        let _guard = self.lock.lock().await;
        Ok(self.read_table(table).await?.remove(id))
    }
}
