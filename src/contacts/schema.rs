//! Column-set probing for tables whose layout varies between app versions

use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashSet;

/// A named column set a query can rely on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVariant {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl SchemaVariant {
    /// `SELECT <columns> FROM "<table>"`
    pub fn select(&self, table: &str) -> String {
        format!("SELECT {} FROM {}", self.columns.join(", "), quote_ident(table))
    }
}

/// Column names of `table`; empty when the table does not exist
pub fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(names)
}

/// First variant, in order, whose columns all exist in `table`
pub fn probe<'a>(
    conn: &Connection,
    table: &str,
    variants: &'a [SchemaVariant],
) -> Result<Option<&'a SchemaVariant>> {
    let present = table_columns(conn, table)?;
    Ok(variants
        .iter()
        .find(|v| v.columns.iter().all(|c| present.contains(*c))))
}

/// Double-quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
