use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::SnapshotError;

/// Writes the latest JSON document to one fixed file, replacing it each time.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pretty-print `json` and overwrite the snapshot file with it.
    pub fn write(&self, json: &Value) -> Result<(), SnapshotError> {
        let mut text = serde_json::to_string_pretty(json)?;
        text.push('\n');

        let io_err = |source: std::io::Error| SnapshotError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        std::fs::write(&self.path, text).map_err(io_err)?;

        debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }
}
