use modsnap_common::{ModSnapError, Snapshot};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// JSON file holding the most recent snapshot
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The previous snapshot, or `None` when it is missing or unreadable.
    /// A corrupt file is logged and left for the next `save` to overwrite.
    pub fn load_previous(&self) -> Option<Snapshot> {
        match read_snapshot(&self.path) {
            Ok(snapshot) => {
                debug!(
                    "Loaded previous snapshot with {} profiles from {}",
                    snapshot.profiles.len(),
                    self.path.display()
                );
                Some(snapshot)
            }
            Err(ModSnapError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("No previous snapshot at {}", self.path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring unreadable snapshot {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Persist snapshot to disk atomically
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), ModSnapError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| ModSnapError::Serialization(e.to_string()))?;

        let temp_file = temp_path(&self.path);
        fs::write(&temp_file, data)?;
        fs::rename(&temp_file, &self.path)?;

        debug!(
            "Saved snapshot with {} profiles to {} (atomic)",
            snapshot.profiles.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Read and parse a snapshot file
pub fn read_snapshot(path: &Path) -> Result<Snapshot, ModSnapError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| ModSnapError::Snapshot(format!("{}: {}", path.display(), e)))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
