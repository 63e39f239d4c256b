//! Durable installation state.
//!
//! One JSON object of string keys at a fixed per-user path. Losing this file
//! only costs redundant work on the next run, so every read is tolerant and
//! every write is best-effort: a store that cannot be persisted never aborts
//! an installation.
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl StateStore {
    /// Read the persisted mapping. Absent or unparsable documents yield an
    /// empty store.
    pub fn load(path: PathBuf) -> Self {
        let entries = read_entries(&path);
        StateStore { path, entries }
    }

    /// Stored fingerprint for `key`, or `""` when unknown. Non-string values
    /// written by other tools are treated as unknown but preserved on write.
    pub fn get(&self, key: &str) -> &str {
        self.entries
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Merge `key -> value` into the persisted mapping, preserving every
    /// other key. Write failures are logged and swallowed.
    pub fn set(&mut self, key: &str, value: &str) {
        // Re-read before merging so keys written since load survive.
        let mut entries = read_entries(&self.path);
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.entries = entries;
        if let Err(err) = self.persist() {
            tracing::warn!("state store write failed: {err:#}");
        }
    }

    /// Delete the state document. Missing documents are not an error.
    pub fn reset(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
        }
    }

    fn persist(&self) -> Result<()> {
        let parent = self.path.parent().context("state path has no parent")?;
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        let text = serde_json::to_string_pretty(&Value::Object(self.entries.clone()))
            .context("serialize state")?;
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("state");
        let tmp_path = parent.join(format!(".{file_name}.tmp"));
        fs::write(&tmp_path, text.as_bytes())
            .with_context(|| format!("write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("publish {}", self.path.display()))?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Map<String, Value> {
    let Ok(bytes) = fs::read(path) else {
        return Map::new();
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map,
        _ => {
            tracing::warn!("unparsable state at {}, starting empty", path.display());
            Map::new()
        }
    }
}
