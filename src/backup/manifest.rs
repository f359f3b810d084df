//! Manifest scanning: which backup rows belong to the target app
//!
//! The manifest is the backup's own `Files` table of
//! `(fileID, domain, relativePath)`. Rows are classified by plain,
//! case-sensitive substring/suffix checks on the logical path. A renamed
//! file inside the app will simply not match.

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use crate::config::PatternConfig;

/// What a matched manifest row holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    ContactDatabase,
    LegacyDatabase,
    MessageShard,
    VoiceNote,
}

impl FileKind {
    pub fn is_database(&self) -> bool {
        !matches!(self, FileKind::VoiceNote)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::ContactDatabase => "contact database",
            FileKind::LegacyDatabase => "legacy database",
            FileKind::MessageShard => "message shard",
            FileKind::VoiceNote => "voice note",
        }
    }
}

/// One manifest row that matched a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file_id: String,
    pub relative_path: String,
    pub kind: FileKind,
}

/// Path predicates for each file kind
#[derive(Debug, Clone)]
pub struct ManifestPatterns {
    pub contact_db: String,
    pub legacy_db: String,
    pub shard_marker: String,
    pub database_suffix: String,
    pub voice_suffix: String,
}

impl From<&PatternConfig> for ManifestPatterns {
    fn from(config: &PatternConfig) -> Self {
        Self {
            contact_db: config.contact_db.clone(),
            legacy_db: config.legacy_db.clone(),
            shard_marker: config.shard_marker.clone(),
            database_suffix: config.database_suffix.clone(),
            voice_suffix: config.voice_suffix.clone(),
        }
    }
}

impl Default for ManifestPatterns {
    fn default() -> Self {
        Self::from(&PatternConfig::default())
    }
}

impl ManifestPatterns {
    /// Classify a logical path. Database kinds are checked before voice notes.
    pub fn classify(&self, relative_path: &str) -> Option<FileKind> {
        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);

        if file_name.ends_with(&self.contact_db) {
            Some(FileKind::ContactDatabase)
        } else if file_name.ends_with(&self.legacy_db) {
            Some(FileKind::LegacyDatabase)
        } else if file_name.contains(&self.shard_marker)
            && file_name.ends_with(&self.database_suffix)
        {
            Some(FileKind::MessageShard)
        } else if file_name.ends_with(&self.voice_suffix) {
            Some(FileKind::VoiceNote)
        } else {
            None
        }
    }
}

/// Open a manifest database read-only
pub fn open_manifest(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open manifest {}", path.display()))
}

/// Rows of `domain` whose path matches one of the patterns. Pure read.
pub fn scan(
    conn: &Connection,
    domain: &str,
    patterns: &ManifestPatterns,
) -> Result<Vec<ManifestEntry>> {
    let mut stmt = conn
        .prepare("SELECT fileID, relativePath FROM Files WHERE domain = ? ORDER BY relativePath")
        .context("Manifest has no Files table")?;

    let rows = stmt.query_map([domain], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut entries = vec![];
    for row in rows {
        let (file_id, relative_path) = row?;
        let Some(relative_path) = relative_path else {
            continue;
        };
        if let Some(kind) = patterns.classify(&relative_path) {
            entries.push(ManifestEntry {
                file_id,
                relative_path,
                kind,
            });
        }
    }

    Ok(entries)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_manifest(conn: &Connection, rows: &[(&str, &str, &str)]) {
        conn.execute_batch(
            "CREATE TABLE Files (fileID TEXT PRIMARY KEY, domain TEXT, relativePath TEXT, flags INTEGER, file BLOB);",
        )
        .unwrap();
        for (id, domain, path) in rows {
            conn.execute(
                "INSERT INTO Files (fileID, domain, relativePath, flags) VALUES (?, ?, ?, 1)",
                [id, domain, path],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_classify_paths() {
        let p = ManifestPatterns::default();
        assert_eq!(
            p.classify("Documents/u1/DB/WCDB_Contact.sqlite"),
            Some(FileKind::ContactDatabase)
        );
        assert_eq!(p.classify("Documents/u1/DB/MM.sqlite"), Some(FileKind::LegacyDatabase));
        assert_eq!(
            p.classify("Documents/u1/DB/message_3.sqlite"),
            Some(FileKind::MessageShard)
        );
        assert_eq!(
            p.classify("Documents/u1/Audio/abc/12.aud"),
            Some(FileKind::VoiceNote)
        );
        assert_eq!(p.classify("Documents/u1/DB/message_3.sqlite-wal"), None);
        // matching is case-sensitive
        assert_eq!(p.classify("Documents/u1/DB/Message_3.SQLITE"), None);
    }

    #[test]
    fn test_scan_filters_domain_and_patterns() {
        let conn = Connection::open_in_memory().unwrap();
        create_manifest(
            &conn,
            &[
                ("aa01", "AppDomain-com.tencent.xin", "Documents/u1/DB/message_1.sqlite"),
                ("bb02", "AppDomain-com.tencent.xin", "Documents/u1/DB/WCDB_Contact.sqlite"),
                ("cc03", "AppDomain-com.tencent.xin", "Documents/u1/Library/prefs.plist"),
                ("dd04", "HomeDomain", "Library/SMS/message_1.sqlite"),
            ],
        );

        let entries = scan(&conn, "AppDomain-com.tencent.xin", &ManifestPatterns::default()).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.file_id.as_str()).collect();
        assert_eq!(ids, vec!["bb02", "aa01"]);
        assert_eq!(entries[0].kind, FileKind::ContactDatabase);
        assert_eq!(entries[1].kind, FileKind::MessageShard);
    }
}
