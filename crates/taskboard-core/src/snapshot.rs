//! Persisted dataset snapshots and the key-value stores holding them.
//!
//! The upload flow writes one [`Snapshot`] under [`DATASET_KEY`]; the
//! dashboard and table views read it back. The schema is versioned and a
//! snapshot that does not match it is rejected as a whole.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Dataset, EntityNormalizer, SnapshotError, StatusLabel, Summary, Task};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Store key of the uploaded dataset
pub const DATASET_KEY: &str = "processedData";

/// Store key of the dashboard-to-table status marker
pub const STATUS_FILTER_KEY: &str = "taskStatusFilter";

/// The blob shared between the upload, dashboard and table views
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub headers: Vec<String>,
    pub tasks: Vec<Task>,
    pub summary: Summary,
}

impl Snapshot {
    pub fn new(dataset: Dataset, summary: Summary) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            headers: dataset.headers,
            tasks: dataset.tasks,
            summary,
        }
    }

    /// Snapshot a dataset together with a freshly computed summary
    pub fn from_dataset(dataset: Dataset, normalizer: &EntityNormalizer) -> Self {
        let summary = dataset.summary(normalizer);
        Self::new(dataset, summary)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }

    /// Parse and validate a stored snapshot.
    ///
    /// The version is checked before any other field so that a blob from a
    /// different schema reports its version rather than a field error.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| SnapshotError::Malformed(e.to_string()))?;

        let version = value
            .get("version")
            .ok_or_else(|| SnapshotError::Malformed("missing field `version`".into()))?
            .as_u64()
            .ok_or_else(|| SnapshotError::Malformed("`version` is not an integer".into()))?;
        if version != u64::from(SNAPSHOT_VERSION) {
            return Err(SnapshotError::UnsupportedVersion {
                found: version,
                expected: SNAPSHOT_VERSION,
            });
        }

        serde_json::from_value(value).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }

    pub fn into_dataset(self) -> Dataset {
        Dataset::new(self.headers, self.tasks)
    }
}

/// String key-value storage for snapshots and markers
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), SnapshotError>;
    fn remove(&mut self, key: &str) -> Result<(), SnapshotError>;
}

/// In-process store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), SnapshotError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SnapshotError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Write the snapshot under [`DATASET_KEY`]
pub fn save(store: &mut dyn SnapshotStore, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    store.put(DATASET_KEY, &snapshot.to_json()?)?;
    debug!(tasks = snapshot.tasks.len(), "snapshot saved");
    Ok(())
}

/// Read the snapshot under [`DATASET_KEY`], `None` when nothing was uploaded
pub fn load(store: &dyn SnapshotStore) -> Result<Option<Snapshot>, SnapshotError> {
    let Some(text) = store.get(DATASET_KEY)? else {
        debug!("no snapshot stored");
        return Ok(None);
    };
    let snapshot = Snapshot::from_json(&text)?;
    debug!(tasks = snapshot.tasks.len(), "snapshot loaded");
    Ok(Some(snapshot))
}

/// Read-once status marker passed from the dashboard to the table view
pub struct StatusHandoff;

impl StatusHandoff {
    /// Store the selected status; `None` (the "total" card) clears the marker
    pub fn set(store: &mut dyn SnapshotStore, status: Option<StatusLabel>) -> Result<(), SnapshotError> {
        match status {
            Some(label) => store.put(STATUS_FILTER_KEY, label.key()),
            None => store.remove(STATUS_FILTER_KEY),
        }
    }

    /// Read and clear the marker
    pub fn take(store: &mut dyn SnapshotStore) -> Result<Option<StatusLabel>, SnapshotError> {
        let Some(raw) = store.get(STATUS_FILTER_KEY)? else {
            return Ok(None);
        };
        store.remove(STATUS_FILTER_KEY)?;
        let label = StatusLabel::from_key(&raw);
        if label.is_none() {
            warn!(raw, "ignoring unknown status marker");
        }
        Ok(label)
    }
}
