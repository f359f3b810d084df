//! Contact resolution: internal contact id -> display name
//!
//! Sources are consulted in registration order and merged, never
//! short-circuited:
//! - `WcdbContacts`: the structured-blob contact database (primary)
//! - `LegacyContacts`: the legacy message database's friend table (fallback)
//!
//! An earlier source always wins for an id it produced. A source that cannot
//! be read contributes nothing and the run continues.

mod legacy;
mod sanitize;
mod schema;
mod wcdb;

pub use legacy::LegacyContacts;
pub use sanitize::{clean_text, is_accepted, sanitize};
pub use schema::{probe, quote_ident, table_columns, SchemaVariant};
pub use wcdb::WcdbContacts;

use anyhow::Result;
use rusqlite::types::ValueRef;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::digest::md5_hex;

/// One contact as read from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub internal_id: String,
    pub display_name: String,
}

/// A place contact names can be read from
pub trait ContactSource {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Whether the backing database was found
    fn is_available(&self) -> bool;

    /// Read every contact. Records with an empty id are not returned.
    fn load(&self) -> Result<Vec<ContactRecord>>;
}

/// Complete id -> name mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactMap {
    names: BTreeMap<String, String>,
}

impl ContactMap {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, internal_id: &str) -> Option<&str> {
        self.names.get(internal_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Add records from a lower-priority source: ids already present are kept
    fn fill(&mut self, records: Vec<ContactRecord>) -> usize {
        // last write wins inside one source
        let mut from_source: BTreeMap<String, String> = BTreeMap::new();
        for record in records {
            from_source.insert(record.internal_id, record.display_name);
        }

        let mut added = 0;
        for (id, name) in from_source {
            if !self.names.contains_key(&id) {
                self.names.insert(id, name);
                added += 1;
            }
        }
        added
    }

    /// `md5(internal_id)` -> `(internal_id, display_name)`, the key conversation
    /// tables are named by
    pub fn by_table_hash(&self) -> HashMap<String, (String, String)> {
        self.names
            .iter()
            .map(|(id, name)| (md5_hex(id), (id.clone(), name.clone())))
            .collect()
    }
}

impl FromIterator<ContactRecord> for ContactMap {
    fn from_iter<T: IntoIterator<Item = ContactRecord>>(iter: T) -> Self {
        let mut map = ContactMap::default();
        map.fill(iter.into_iter().collect());
        map
    }
}

/// Ordered set of contact sources
pub struct ContactResolver {
    sources: Vec<Box<dyn ContactSource>>,
}

impl ContactResolver {
    /// Primary then fallback source, both located under `input_dir`
    pub fn new(input_dir: &Path, config: &Config) -> Self {
        let mut resolver = Self { sources: vec![] };
        resolver.register(Box::new(WcdbContacts::locate(
            input_dir,
            &config.patterns.contact_db,
        )));
        resolver.register(Box::new(LegacyContacts::locate(
            input_dir,
            &config.patterns.legacy_db,
        )));
        resolver
    }

    pub fn empty() -> Self {
        Self { sources: vec![] }
    }

    pub fn register(&mut self, source: Box<dyn ContactSource>) {
        self.sources.push(source);
    }

    /// Merge all sources. Never fails: unreadable sources are logged and skipped.
    pub fn resolve(&self) -> ContactMap {
        let mut map = ContactMap::default();

        for source in &self.sources {
            if !source.is_available() {
                warn!(source = source.name(), "Contact source not found");
                continue;
            }
            match source.load() {
                Ok(records) => {
                    let read = records.len();
                    let added = map.fill(records);
                    info!(source = source.name(), read, added, "Loaded contacts");
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Contact source unreadable, skipping");
                }
            }
        }

        map
    }
}

/// Bytes of a column value, whatever its storage class
pub(crate) fn value_bytes(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Text(t) | ValueRef::Blob(t) => t.to_vec(),
        ValueRef::Integer(i) => i.to_string().into_bytes(),
        ValueRef::Real(r) => r.to_string().into_bytes(),
        ValueRef::Null => vec![],
    }
}

/// Internal id exactly as stored. Conversation tables are named by its hash,
/// so nothing is trimmed or filtered.
pub(crate) fn raw_id(value: ValueRef<'_>) -> String {
    String::from_utf8_lossy(&value_bytes(value)).into_owned()
}

/// First non-empty candidate, else the internal id
pub(crate) fn pick_name(candidates: &[String], internal_id: &str) -> String {
    candidates
        .iter()
        .find(|c| !c.is_empty())
        .cloned()
        .unwrap_or_else(|| internal_id.to_string())
}
