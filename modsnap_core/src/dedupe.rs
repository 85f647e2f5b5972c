use modsnap_common::{DuplicateEntry, ModSnapError};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How a duplicate was disposed of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionMethod {
    DryRun,
    Trash,
    Permanent,
}

/// Result of deleting one duplicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub profile: String,
    pub path: PathBuf,
    pub method: DeletionMethod,
    pub success: bool,
    pub error: Option<String>,
}

/// Removes duplicate mod files left behind by gathering
pub struct DuplicateDeleter {
    dry_run: bool,
    use_trash: bool,
}

impl DuplicateDeleter {
    pub fn new(dry_run: bool, use_trash: bool) -> Self {
        Self { dry_run, use_trash }
    }

    fn method(&self) -> DeletionMethod {
        if self.dry_run {
            DeletionMethod::DryRun
        } else if self.use_trash {
            DeletionMethod::Trash
        } else {
            DeletionMethod::Permanent
        }
    }

    /// Delete a file (with optional trash support)
    pub fn delete_file(&self, path: &Path) -> Result<DeletionMethod, ModSnapError> {
        if self.dry_run {
            info!("DRY RUN: Would delete {}", path.display());
            return Ok(DeletionMethod::DryRun);
        }

        if !path.is_file() {
            return Err(ModSnapError::Deletion(format!(
                "Not a file: {}",
                path.display()
            )));
        }

        if self.use_trash {
            debug!("Moving {} to trash", path.display());
            trash::delete(path).map_err(|e| ModSnapError::Io(io::Error::other(e.to_string())))?;
            info!("Moved {} to trash", path.display());
            Ok(DeletionMethod::Trash)
        } else {
            debug!("Permanently deleting {}", path.display());
            fs::remove_file(path)?;
            info!("Deleted {}", path.display());
            Ok(DeletionMethod::Permanent)
        }
    }

    /// Delete every duplicate; failures are reported per entry and never stop the batch
    pub fn delete_all(&self, duplicates: &[DuplicateEntry]) -> Vec<DeletionOutcome> {
        let outcomes: Vec<DeletionOutcome> = duplicates
            .iter()
            .map(|entry| match self.delete_file(&entry.path) {
                Ok(method) => DeletionOutcome {
                    profile: entry.profile.clone(),
                    path: entry.path.clone(),
                    method,
                    success: true,
                    error: None,
                },
                Err(e) => {
                    warn!("Failed to delete {}: {}", entry.path.display(), e);
                    DeletionOutcome {
                        profile: entry.profile.clone(),
                        path: entry.path.clone(),
                        method: self.method(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.success).count();
        info!(
            "Processed {} duplicates ({} failed)",
            outcomes.len(),
            failed
        );
        outcomes
    }
}
