//! Device backup access
//!
//! A backup root holds a manifest database plus content files named by hash
//! and sharded by the first two hex characters:
//!
//! ```text
//! <root>/Manifest.db
//! <root>/3d/3d0d7e5fb2ce288813306e4d4636395e047a3d28
//! ```
//!
//! Extraction scans the manifest for the app's databases (and optionally voice
//! notes) and copies them to `<output>/<owner>/...`.

mod content;
mod extract;
mod locator;
mod manifest;
mod owner;

pub use content::{resolve, ResolvedFile};
pub use extract::{destination, extract_entries, ExtractedFile, ExtractionReport, AUDIO_DIR};
pub use locator::{locate_backups, BackupCandidate};
pub use manifest::{open_manifest, scan, FileKind, ManifestEntry, ManifestPatterns};
pub use owner::{database_owner, media_owner, UNKNOWN_OWNER};

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::error::KeepsakeError;

/// Extract the app's databases (and voice notes when asked) from one backup
pub fn extract_from_backup(
    backup_root: &Path,
    output_dir: &Path,
    config: &Config,
    include_audio: bool,
) -> Result<ExtractionReport> {
    let manifest_path = backup_root.join(&config.backup.manifest_file);
    if !manifest_path.exists() {
        return Err(KeepsakeError::ManifestMissing(manifest_path).into());
    }

    let patterns = ManifestPatterns::from(&config.patterns);
    let entries = {
        let conn = open_manifest(&manifest_path)?;
        scan(&conn, &config.backup.domain, &patterns)?
    };

    let selected: Vec<ManifestEntry> = entries
        .into_iter()
        .filter(|e| include_audio || e.kind.is_database())
        .collect();
    info!(
        domain = %config.backup.domain,
        matched = selected.len(),
        "Scanned manifest"
    );

    extract_entries(backup_root, &selected, output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::fs;
    use tempfile::tempdir;

    fn put_content(root: &Path, id: &str, data: &[u8]) {
        fs::create_dir_all(root.join(&id[..2])).unwrap();
        fs::write(root.join(&id[..2]).join(id), data).unwrap();
    }

    #[test]
    fn test_extract_skips_audio_unless_requested() {
        let backup = tempdir().unwrap();
        let conn = Connection::open(backup.path().join("Manifest.db")).unwrap();
        manifest::tests::create_manifest(
            &conn,
            &[
                ("aa01", "AppDomain-com.tencent.xin", "Documents/u1/DB/message_1.sqlite"),
                ("bb02", "AppDomain-com.tencent.xin", "Documents/u1/Audio/c/7.aud"),
            ],
        );
        drop(conn);
        put_content(backup.path(), "aa01", b"shard");
        put_content(backup.path(), "bb02", b"voice");

        let config = Config::default();
        let out = tempdir().unwrap();
        let report = extract_from_backup(backup.path(), out.path(), &config, false).unwrap();
        assert_eq!(report.extracted.len(), 1);
        assert!(!out.path().join("u1/Audio/7.aud").exists());

        let report = extract_from_backup(backup.path(), out.path(), &config, true).unwrap();
        assert_eq!(report.count(FileKind::VoiceNote), 1);
        assert_eq!(fs::read(out.path().join("u1/Audio/7.aud")).unwrap(), b"voice");
    }

    #[test]
    fn test_missing_manifest_is_precondition_failure() {
        let backup = tempdir().unwrap();
        let out = tempdir().unwrap();
        let err = extract_from_backup(backup.path(), out.path(), &Config::default(), false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KeepsakeError>(),
            Some(KeepsakeError::ManifestMissing(_))
        ));
    }
}
