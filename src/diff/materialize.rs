use crate::error::GitResult;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempPath;
use tracing::debug;

/// Writes fetched bytes to uniquely named temp files for viewers that need a path
///
/// Every call creates a new file. At most one file is kept per key: writing a key
/// again deletes the file it replaces. Remaining files are removed when the
/// materializer is dropped or `cleanup` is called.
#[derive(Debug, Default)]
pub struct Materializer {
    files: Mutex<HashMap<String, TempPath>>,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` in a fresh temp file carrying `name`'s extension, superseding
    /// the previous file written under `key`
    pub fn write(&self, key: &str, name: &str, bytes: &[u8]) -> GitResult<PathBuf> {
        let suffix = Path::new(name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("stash-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let temp_path = file.into_temp_path();
        let path = temp_path.to_path_buf();
        debug!("Materialized {} ({} bytes) at {}", name, bytes.len(), path.display());

        if self.lock().insert(key.to_string(), temp_path).is_some() {
            debug!("Removed superseded temp file for {}", key);
        }
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete every file written so far
    pub fn cleanup(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TempPath>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
