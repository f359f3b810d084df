//! Copy matched manifest rows out of the content store

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::content;
use super::manifest::{FileKind, ManifestEntry};
use super::owner;

/// Name of the per-owner voice media directory
pub const AUDIO_DIR: &str = "Audio";

/// A file copied from the content store into the working tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub file_id: String,
    pub destination: PathBuf,
    pub owner: String,
    pub kind: FileKind,
}

/// Outcome of an extraction pass
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub extracted: Vec<ExtractedFile>,
    pub skipped: usize,
}

impl ExtractionReport {
    pub fn count(&self, kind: FileKind) -> usize {
        self.extracted.iter().filter(|f| f.kind == kind).count()
    }
}

/// Destination of a manifest row under the output directory
pub fn destination(output_dir: &Path, entry: &ManifestEntry) -> (String, PathBuf) {
    let file_name = entry
        .relative_path
        .rsplit('/')
        .next()
        .unwrap_or(&entry.relative_path);

    if entry.kind.is_database() {
        let owner = owner::database_owner(&entry.relative_path);
        let path = output_dir.join(&owner).join(file_name);
        (owner, path)
    } else {
        let owner = owner::media_owner(&entry.relative_path);
        let path = output_dir.join(&owner).join(AUDIO_DIR).join(file_name);
        (owner, path)
    }
}

/// Copy every entry out of the backup. Missing content files and copy
/// failures are skipped per row.
pub fn extract_entries(
    backup_root: &Path,
    entries: &[ManifestEntry],
    output_dir: &Path,
) -> Result<ExtractionReport> {
    fs::create_dir_all(output_dir)?;
    let mut report = ExtractionReport::default();

    for entry in entries {
        let source = content::resolve(backup_root, &entry.file_id);
        if !source.exists {
            warn!(
                file_id = %entry.file_id,
                path = %entry.relative_path,
                "Source file missing in backup, skipping"
            );
            report.skipped += 1;
            continue;
        }

        let (owner, target) = destination(output_dir, entry);
        if let Err(e) = copy_file(&source.path, &target) {
            warn!(target = %target.display(), error = %e, "Copy failed, skipping");
            report.skipped += 1;
            continue;
        }

        if entry.kind.is_database() {
            info!(kind = entry.kind.as_str(), owner = %owner, target = %target.display(), "Extracted");
        }

        report.extracted.push(ExtractedFile {
            file_id: entry.file_id.clone(),
            destination: target,
            owner,
            kind: entry.kind,
        });
    }

    Ok(report)
}

fn copy_file(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(id: &str, path: &str, kind: FileKind) -> ManifestEntry {
        ManifestEntry {
            file_id: id.to_string(),
            relative_path: path.to_string(),
            kind,
        }
    }

    #[test]
    fn test_destination_layout() {
        let out = Path::new("/out");
        let (owner, db) = destination(
            out,
            &entry("aa", "Documents/u1/DB/message_2.sqlite", FileKind::MessageShard),
        );
        assert_eq!(owner, "u1");
        assert_eq!(db, PathBuf::from("/out/u1/message_2.sqlite"));

        let (_, audio) = destination(
            out,
            &entry("bb", "Documents/u1/Audio/c1/42.aud", FileKind::VoiceNote),
        );
        assert_eq!(audio, PathBuf::from("/out/u1/Audio/42.aud"));
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let backup = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::create_dir_all(backup.path().join("aa")).unwrap();
        fs::write(backup.path().join("aa/aa11"), b"db").unwrap();

        let entries = vec![
            entry("aa11", "Documents/u1/DB/MM.sqlite", FileKind::LegacyDatabase),
            entry("ff99", "Documents/u1/DB/message_1.sqlite", FileKind::MessageShard),
        ];
        let report = extract_entries(backup.path(), &entries, out.path()).unwrap();

        assert_eq!(report.extracted.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.count(FileKind::LegacyDatabase), 1);
        assert_eq!(fs::read(out.path().join("u1/MM.sqlite")).unwrap(), b"db");
    }
}
