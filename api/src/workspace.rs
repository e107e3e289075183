use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tokio::fs;

/// What a workspace reset removed and which entries it could not.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CleanupReport {
    pub removed: usize,
    pub warnings: Vec<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Makes sure `dir` exists and holds nothing.
///
/// Entries are removed one by one; a failure on one entry is recorded as a
/// warning and the rest are still attempted. Only failing to create or list
/// the directory itself is an error.
pub async fn reset_workspace(dir: &Path) -> Result<CleanupReport> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create workspace {}", dir.display()))?;

    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list workspace {}", dir.display()))?;

    let mut report = CleanupReport::default();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Stopped listing {}: {}", dir.display(), e);
                report.warnings.push(format!("Error while removing existing files: {e}"));
                break;
            }
        };

        let path = entry.path();
        match remove_entry(&path).await {
            Ok(()) => report.removed += 1,
            Err(e) => {
                log::warn!("Could not remove {}: {}", path.display(), e);
                report
                    .warnings
                    .push(format!("Error while removing existing files: {}: {e}", path.display()));
            }
        }
    }

    log::info!(
        "Workspace {} reset ({} removed, {} warnings)",
        dir.display(),
        report.removed,
        report.warnings.len()
    );
    Ok(report)
}

// Symlinks are unlinked, never followed.
async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let metadata = fs::symlink_metadata(path).await?;
    if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}
