//! Persisted build state.
//!
//! [`StateStore`] is a flat JSON object on disk (`state.db` in the storage
//! root) mapping dotted keys to JSON values. Phases record completion as
//! `<recipe>.<phase>[.<arg>] = true` plus a `<key>.at` UTC timestamp, so
//! interrupted builds resume where they stopped. Every write syncs the whole
//! file; writes are last-write-wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// File-backed key/value store.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    data: Map<String, Value>,
}

impl StateStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(data) => data,
                Err(e) => {
                    warn!(
                        "Unable to read {} ({}), content will be replaced",
                        path.display(),
                        e
                    );
                    Map::new()
                }
            }
        } else {
            Map::new()
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.data.insert(key.to_string(), value);
        self.sync()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.data.remove(key).is_some() {
            self.sync()?;
        }
        Ok(())
    }

    /// Remove every key starting with `prefix`.
    pub fn remove_all(&mut self, prefix: &str) -> Result<usize> {
        self.remove_where(|key| key.starts_with(prefix))
    }

    /// Remove every key matching `predicate`, returning how many went.
    pub fn remove_where<F>(&mut self, predicate: F) -> Result<usize>
    where
        F: Fn(&str) -> bool,
    {
        let before = self.data.len();
        self.data.retain(|key, _| !predicate(key));
        let removed = before - self.data.len();
        if removed > 0 {
            self.sync()?;
        }
        Ok(removed)
    }

    /// Record `key` as completed now.
    pub fn mark_done(&mut self, key: &str) -> Result<()> {
        self.data.insert(key.to_string(), Value::Bool(true));
        self.data.insert(
            format!("{}.at", key),
            Value::String(Utc::now().to_rfc3339()),
        );
        self.sync()
    }

    /// Whether `key` was recorded as completed.
    pub fn is_done(&self, key: &str) -> bool {
        matches!(self.data.get(key), Some(Value::Bool(true)))
    }

    fn sync(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(&self.data)?;
        fs::write(&self.path, content).map_err(|e| Error::StateStore {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Key for a completed phase: `<recipe>.<phase>[.<arg>]`.
pub fn phase_key(recipe: &str, phase: &str, arg: Option<&str>) -> String {
    match arg {
        Some(arg) => format!("{}.{}.{}", recipe, phase, arg),
        None => format!("{}.{}", recipe, phase),
    }
}
