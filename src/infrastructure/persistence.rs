//! Snapshot persistence
//!
//! Pretty-printed JSON array of snapshots, oldest first. Writes go to a
//! temporary sibling file which is then renamed over the target, so a crash
//! mid-write leaves the previous file intact.

use crate::snapshot::Snapshot;
use crate::{log_snapshot, Result, TrackerError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

/// JSON file holding the retained snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize and atomically replace the file
    pub fn save(&self, snapshots: &[Snapshot]) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshots)
            .map_err(|e| TrackerError::Persistence(format!("serialize: {}", e)))?;

        let tmp = self.temp_path();
        if let Err(e) = write_file(&tmp, &json).and_then(|_| fs::rename(&tmp, &self.path)) {
            // Best effort; the temp file may not exist
            let _ = fs::remove_file(&tmp);
            return Err(TrackerError::Persistence(format!(
                "write {}: {}",
                self.path.display(),
                e
            )));
        }

        log_snapshot!(
            Level::INFO,
            "Saved {} snapshots to {}",
            snapshots.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the file. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<Snapshot>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TrackerError::Persistence(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&contents).map_err(|e| {
            TrackerError::Persistence(format!("parse {}: {}", self.path.display(), e))
        })
    }

    /// Like `load`, but any failure is logged and yields an empty list
    pub fn load_or_empty(&self) -> Vec<Snapshot> {
        match self.load() {
            Ok(snapshots) => {
                log_snapshot!(
                    Level::INFO,
                    "Loaded {} snapshots from {}",
                    snapshots.len(),
                    self.path.display()
                );
                snapshots
            }
            Err(e) => {
                log_snapshot!(Level::ERROR, "Error loading snapshots: {}", e);
                Vec::new()
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshots".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
