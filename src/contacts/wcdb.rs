//! Primary contact source: the WCDB contact database
//!
//! `Friend` rows carry the id as text and names inside serialized blobs
//! (`dbContactRemark`, `dbContactProfile`). Names are recovered with
//! [`sanitize`](super::sanitize).

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{pick_name, probe, raw_id, sanitize, value_bytes, ContactRecord, ContactSource, SchemaVariant};
use crate::workdir;

const TABLE: &str = "Friend";

const VARIANTS: &[SchemaVariant] = &[
    SchemaVariant {
        name: "remark+profile",
        columns: &["userName", "dbContactRemark", "dbContactProfile"],
    },
    SchemaVariant {
        name: "remark",
        columns: &["userName", "dbContactRemark"],
    },
];

pub struct WcdbContacts {
    db_path: Option<PathBuf>,
}

impl WcdbContacts {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path: Some(db_path),
        }
    }

    /// Use the first file under `dir` whose name ends with `file_suffix`
    pub fn locate(dir: &Path, file_suffix: &str) -> Self {
        Self {
            db_path: workdir::find_first(dir, file_suffix),
        }
    }
}

impl ContactSource for WcdbContacts {
    fn name(&self) -> &str {
        "wcdb"
    }

    fn is_available(&self) -> bool {
        self.db_path.as_ref().map(|p| p.exists()).unwrap_or(false)
    }

    fn load(&self) -> Result<Vec<ContactRecord>> {
        let Some(path) = &self.db_path else {
            bail!("contact database not found");
        };
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let Some(variant) = probe(&conn, TABLE, VARIANTS)? else {
            bail!("{} table has none of the known column sets", TABLE);
        };
        info!(path = %path.display(), variant = variant.name, "Reading contact blobs");

        let mut stmt = conn.prepare(&variant.select(TABLE))?;
        let rows = stmt.query_map([], |row| {
            let internal_id = raw_id(row.get_ref(0)?);
            let mut candidates = vec![];
            for idx in 1..variant.columns.len() {
                candidates.push(sanitize(&value_bytes(row.get_ref(idx)?)));
            }
            Ok((internal_id, candidates))
        })?;

        let mut records = vec![];
        for row in rows {
            let (internal_id, candidates) = row?;
            if internal_id.is_empty() {
                continue;
            }
            let display_name = pick_name(&candidates, &internal_id);
            records.push(ContactRecord {
                internal_id,
                display_name,
            });
        }

        Ok(records)
    }
}
