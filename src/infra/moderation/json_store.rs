use crate::core::moderation::{ModerationError, ModerationStore};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// JSON-file moderation store: the device's local storage.
/// Persists the whole record as a flat map: { "violationCount": "2", ... }
pub struct JsonModerationStore {
    path: PathBuf,
    cache: DashMap<String, String>,
}

impl JsonModerationStore {
    /// Load the record from `path`. A missing file starts empty; an unreadable
    /// or corrupted one is logged and also starts empty.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = DashMap::new();

        match load(&path) {
            Ok(values) => {
                for (key, value) in values {
                    cache.insert(key, value);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Discarding unreadable moderation record at {}: {}",
                    path.display(),
                    e
                );
            }
        }

        Self { path, cache }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), ModerationError> {
        // BTreeMap keeps the file diff-friendly
        let snapshot: BTreeMap<String, String> = self
            .cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        // Write a sibling file and rename it over the record, so a failed
        // write never leaves a truncated record behind
        let tmp_path = self.tmp_path();
        let result = write_snapshot(&tmp_path, &snapshot)
            .and_then(|_| std::fs::rename(&tmp_path, &self.path));
        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(ModerationError::StorageUnavailable(e.to_string()));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "moderation.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_snapshot(path: &Path, snapshot: &BTreeMap<String, String>) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn load(path: &Path) -> Result<BTreeMap<String, String>, ModerationError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let file = File::open(path).map_err(|e| ModerationError::StorageUnavailable(e.to_string()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        ModerationError::StorageUnavailable(format!("corrupted moderation record: {}", e))
    })
}

impl ModerationStore for JsonModerationStore {
    fn get(&self, key: &str) -> Result<Option<String>, ModerationError> {
        Ok(self.cache.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ModerationError> {
        self.cache.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&self, key: &str) -> Result<(), ModerationError> {
        if self.cache.remove(key).is_none() {
            return Ok(());
        }
        self.persist()
    }
}
