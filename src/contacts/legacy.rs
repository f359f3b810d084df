//! Fallback contact source: the legacy `MM.sqlite` friend table
//!
//! Names are plain text columns. Older builds lack `RemarkName`.

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{pick_name, probe, raw_id, sanitize, value_bytes, ContactRecord, ContactSource, SchemaVariant};
use crate::workdir;

const TABLE: &str = "Friend";

// Column order: id, then name candidates by preference
const VARIANTS: &[SchemaVariant] = &[
    SchemaVariant {
        name: "remark+nickname",
        columns: &["UsrName", "RemarkName", "NickName"],
    },
    SchemaVariant {
        name: "nickname",
        columns: &["UsrName", "NickName"],
    },
];

pub struct LegacyContacts {
    db_path: Option<PathBuf>,
}

impl LegacyContacts {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path: Some(db_path),
        }
    }

    pub fn locate(dir: &Path, file_suffix: &str) -> Self {
        Self {
            db_path: workdir::find_first(dir, file_suffix),
        }
    }
}

impl ContactSource for LegacyContacts {
    fn name(&self) -> &str {
        "legacy"
    }

    fn is_available(&self) -> bool {
        self.db_path.as_ref().map(|p| p.exists()).unwrap_or(false)
    }

    fn load(&self) -> Result<Vec<ContactRecord>> {
        let Some(path) = &self.db_path else {
            bail!("legacy database not found");
        };
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let Some(variant) = probe(&conn, TABLE, VARIANTS)? else {
            bail!("{} table has none of the known column sets", TABLE);
        };
        info!(path = %path.display(), variant = variant.name, "Reading legacy friend table");

        let mut stmt = conn.prepare(&variant.select(TABLE))?;
        let records = stmt
            .query_map([], |row| {
                let internal_id = raw_id(row.get_ref(0)?);
                let mut candidates = vec![];
                for idx in 1..variant.columns.len() {
                    candidates.push(sanitize(&value_bytes(row.get_ref(idx)?)));
                }
                Ok((internal_id, candidates))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|(id, _)| !id.is_empty())
            .map(|(internal_id, candidates)| ContactRecord {
                display_name: pick_name(&candidates, &internal_id),
                internal_id,
            })
            .collect();

        Ok(records)
    }
}
