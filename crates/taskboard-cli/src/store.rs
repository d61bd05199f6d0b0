//! Directory-backed snapshot store: one file per key

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use taskboard_core::{SnapshotError, SnapshotStore};
use tracing::debug;

/// Keeps each key in `<dir>/<key>.json`
#[derive(Clone, Debug)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SnapshotStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::Store(format!("{}: {e}", path.display()))),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| SnapshotError::Store(format!("{}: {e}", self.dir.display())))?;
        let path = self.path(key);
        fs::write(&path, value)
            .map_err(|e| SnapshotError::Store(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = value.len(), "stored");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SnapshotError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnapshotError::Store(format!("{}: {e}", path.display()))),
        }
    }
}
