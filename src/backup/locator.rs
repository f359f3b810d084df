//! Backup discovery across search roots

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A directory that looks like a device backup snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupCandidate {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// Find every immediate subdirectory of the roots that holds a manifest,
/// newest first. Unreadable roots are skipped with a warning.
pub fn locate_backups(roots: &[PathBuf], manifest_file: &str) -> Vec<BackupCandidate> {
    let mut candidates = vec![];

    for root in roots {
        if !root.exists() {
            continue;
        }

        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Cannot scan backup root, skipping");
                continue;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let dir = entry.path();
            if !dir.is_dir() || !dir.join(manifest_file).exists() {
                continue;
            }
            match modified_at(&dir) {
                Some(modified) => candidates.push(BackupCandidate {
                    path: dir,
                    modified,
                }),
                None => warn!(path = %dir.display(), "Cannot read backup modification time"),
            }
        }
    }

    candidates.sort_by(|a, b| b.modified.cmp(&a.modified));
    candidates
}

fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
