//! Best-effort persistence for derived watcher state.
//!
//! Each map is stored as one JSON blob under a fixed key. Writes are
//! fire-and-forget: a failed write is logged and the in-memory state is
//! kept as-is.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const EVENTS_KEY: &str = "bot-monitor-events";
pub const DOWNTIME_KEY: &str = "bot-monitor-downtime";

/// Key-value JSON blob store backed by files in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Load the blob under `key`, substituting `default` when the file is
    /// missing or does not parse.
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Discarding malformed state in {}: {}", path.display(), e);
                    default
                }
            },
            Err(_) => default,
        }
    }

    /// Write the blob under `key`. Failures are logged and swallowed.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Failed to serialize state for {}: {}", key, e);
                return;
            }
        };

        let path = self.path_for(key);
        if let Err(e) = fs::write(&path, raw) {
            tracing::error!("Failed to write {}: {}", path.display(), e);
        }
    }
}
