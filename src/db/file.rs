use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::{fs, sync::Mutex};

use crate::{
    db::StorageBackend,
    error::{AppError, AppResult},
    models::TrackedGame,
};

/// Local JSON file backend
///
/// The whole library is one JSON array, rewritten in full on every mutation.
/// New records go to the front so the file reads newest-first. A missing file
/// is an empty library. Records are kept as raw JSON between read and write,
/// so entries this build cannot decode survive every rewrite untouched.
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> AppResult<Vec<Value>> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&data)
            .map_err(|e| AppError::Storage(format!("library file is not a JSON array: {}", e)))
    }

    async fn read_games(&self) -> AppResult<Vec<TrackedGame>> {
        Ok(self.read_raw().await?.into_iter().filter_map(decode).collect())
    }

    /// Writes to a sibling temp file and renames it over the library file
    async fn write_raw(&self, records: &[Value]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");

        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn record_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

/// Decodes one record; undecodable ones are logged and left out of reads
fn decode(value: Value) -> Option<TrackedGame> {
    let id = record_id(&value).unwrap_or("?").to_string();
    match serde_json::from_value(value) {
        Ok(game) => Some(game),
        Err(e) => {
            tracing::warn!(game_id = %id, error = %e, backend = "file", "Skipping malformed library record");
            None
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for FileBackend {
    async fn list(&self) -> AppResult<Vec<TrackedGame>> {
        self.read_games().await
    }

    async fn get(&self, id: &str) -> AppResult<Option<TrackedGame>> {
        Ok(self.read_games().await?.into_iter().find(|g| g.id == id))
    }

    async fn put(&self, game: &TrackedGame) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_raw().await?;
        let value = serde_json::to_value(game)?;

        match records.iter().position(|r| record_id(r) == Some(game.id.as_str())) {
            Some(index) => records[index] = value,
            None => records.insert(0, value),
        }

        self.write_raw(&records).await?;
        tracing::debug!(game_id = %game.id, path = %self.path.display(), "Library file written");
        Ok(())
    }

    async fn remove(&self, id: &str) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_raw().await?;

        let Some(index) = records.iter().position(|r| record_id(r) == Some(id)) else {
            return Ok(false);
        };

        records.remove(index);
        self.write_raw(&records).await?;
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
