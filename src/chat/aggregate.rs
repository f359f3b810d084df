//! Message aggregation across shard databases
//!
//! Each shard holds many `Chat_<md5(internal id)>` tables, one per contact or
//! group. Tables are attributed through the contact map's hash index; a table
//! whose hash matches no contact is kept under a placeholder identity.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{Conversation, Message};
use crate::config::ChatConfig;
use crate::contacts::{clean_text, quote_ident, table_columns, ContactMap};

/// Stand-in content for rows whose message column holds raw bytes
pub const BINARY_CONTENT: &str = "[BINARY DATA]";

const TIME_COLUMN: &str = "CreateTime";
const MESSAGE_COLUMNS: &[&str] = &["CreateTime", "Message", "Des", "Type", "MesLocalID"];

/// Counts from one aggregation run
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub shards: usize,
    pub failed_shards: Vec<PathBuf>,
    pub tables: usize,
    pub failed_tables: usize,
    pub unknown_tables: usize,
    pub messages: usize,
}

pub struct Aggregator {
    table_prefix: String,
    aux_table_prefix: String,
    self_sender: String,
    by_hash: HashMap<String, (String, String)>,
}

impl Aggregator {
    /// The contact map must be complete: table attribution depends on it
    pub fn new(contacts: &ContactMap, chat: &ChatConfig) -> Self {
        Self {
            table_prefix: chat.table_prefix.clone(),
            aux_table_prefix: chat.aux_table_prefix.clone(),
            self_sender: chat.self_sender.clone(),
            by_hash: contacts.by_table_hash(),
        }
    }

    /// Whether a table name follows the conversation naming convention
    pub fn is_conversation_table(&self, name: &str) -> bool {
        name.starts_with(&self.table_prefix) && !name.starts_with(&self.aux_table_prefix)
    }

    /// Contact id and name for a table hash, or a placeholder
    pub fn identity(&self, table_hash: &str) -> (String, String, bool) {
        match self.by_hash.get(table_hash) {
            Some((id, name)) => (id.clone(), name.clone(), true),
            None => (
                format!("unknown:{}", table_hash),
                format!("Unknown ({})", table_hash),
                false,
            ),
        }
    }

    /// Read every shard in order. Conversations for the same contact found in
    /// several shards are merged; conversations without messages are dropped.
    pub fn aggregate(&self, shards: &[PathBuf]) -> (Vec<Conversation>, AggregateReport) {
        let mut report = AggregateReport::default();
        let mut conversations: Vec<Conversation> = vec![];
        let mut positions: HashMap<String, usize> = HashMap::new();

        for shard in shards {
            report.shards += 1;
            let found = match self.read_shard(shard, &mut report) {
                Ok(found) => found,
                Err(e) => {
                    warn!(shard = %shard.display(), error = %e, "Shard unreadable, skipping");
                    report.failed_shards.push(shard.clone());
                    continue;
                }
            };

            for conversation in found {
                report.messages += conversation.messages.len();
                match positions.get(&conversation.friend_id).copied() {
                    Some(idx) => {
                        let existing = &mut conversations[idx];
                        existing.messages.extend(conversation.messages);
                        existing.messages.sort_by_key(|m| m.timestamp);
                    }
                    None => {
                        positions.insert(conversation.friend_id.clone(), conversations.len());
                        conversations.push(conversation);
                    }
                }
            }
        }

        (conversations, report)
    }

    /// All non-empty conversations in one shard. Per-table failures are logged
    /// and counted; only a shard that cannot be opened or listed is an error.
    pub fn read_shard(&self, path: &Path, report: &mut AggregateReport) -> Result<Vec<Conversation>> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let tables = self.conversation_tables(&conn)?;
        info!(shard = %path.display(), tables = tables.len(), "Reading shard");

        let mut conversations = vec![];
        for table in tables {
            report.tables += 1;
            let table_hash = &table[self.table_prefix.len()..];
            let (friend_id, friend_name, known) = self.identity(table_hash);
            if !known {
                report.unknown_tables += 1;
                debug!(table = %table, "No contact for table hash");
            }

            let messages = match self.read_table(&conn, &table, &friend_name) {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(shard = %path.display(), table = %table, error = %e, "Table unreadable, skipping");
                    report.failed_tables += 1;
                    continue;
                }
            };
            if messages.is_empty() {
                continue;
            }

            conversations.push(Conversation {
                friend_id,
                friend_name,
                messages,
            });
        }

        Ok(conversations)
    }

    /// Conversation tables in a shard, sorted by name
    pub fn conversation_tables(&self, conn: &Connection) -> Result<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names
            .into_iter()
            .filter(|n| self.is_conversation_table(n))
            .collect())
    }

    /// Messages of one table, oldest first
    pub fn read_table(&self, conn: &Connection, table: &str, friend_name: &str) -> Result<Vec<Message>> {
        let present = table_columns(conn, table)?;
        let missing: Vec<&str> = MESSAGE_COLUMNS
            .iter()
            .copied()
            .filter(|c| !present.contains(*c))
            .collect();
        if !missing.is_empty() {
            bail!("missing columns: {}", missing.join(", "));
        }

        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} ASC",
            MESSAGE_COLUMNS.join(", "),
            quote_ident(table),
            TIME_COLUMN
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut messages = stmt
            .query_map([], |row| {
                let is_sender = matches!(row.get_ref(2)?, ValueRef::Integer(1));
                let sender = if is_sender {
                    self.self_sender.clone()
                } else {
                    friend_name.to_string()
                };
                Ok(Message {
                    id: to_id(row.get_ref(4)?),
                    timestamp: to_timestamp(row.get_ref(0)?),
                    sender,
                    content: to_content(row.get_ref(1)?),
                    msg_type: to_integer(row.get_ref(3)?),
                    is_sender,
                    transcription: None,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // ORDER BY does not order mixed storage classes by value
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }
}

fn to_timestamp(value: ValueRef<'_>) -> DateTime<Utc> {
    let secs = to_integer(value);
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn to_integer(value: ValueRef<'_>) -> i64 {
    match value {
        ValueRef::Integer(i) => i,
        ValueRef::Real(r) => r as i64,
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0),
        ValueRef::Blob(_) | ValueRef::Null => 0,
    }
}

fn to_content(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Text(t) => clean_text(&String::from_utf8_lossy(t)),
        ValueRef::Blob(_) => BINARY_CONTENT.to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
    }
}

fn to_id(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::ContactRecord;
    use crate::digest::md5_hex;
    use tempfile::tempdir;

    fn contacts(pairs: &[(&str, &str)]) -> ContactMap {
        pairs
            .iter()
            .map(|(id, name)| ContactRecord {
                internal_id: id.to_string(),
                display_name: name.to_string(),
            })
            .collect()
    }

    fn create_chat_table(conn: &Connection, table: &str) {
        conn.execute_batch(&format!(
            "CREATE TABLE {} (TableVer INTEGER, MesLocalID INTEGER PRIMARY KEY, MesSvrID INTEGER, \
             CreateTime INTEGER, Message TEXT, Status INTEGER, ImgStatus INTEGER, Type INTEGER, Des INTEGER);",
            quote_ident(table)
        ))
        .unwrap();
    }

    fn aggregator(map: &ContactMap) -> Aggregator {
        Aggregator::new(map, &ChatConfig::default())
    }

    #[test]
    fn test_table_filter() {
        let agg = aggregator(&ContactMap::default());
        assert!(agg.is_conversation_table("Chat_900150983cd24fb0d6963f7d28e17f72"));
        assert!(!agg.is_conversation_table("ChatExt2_900150983cd24fb0d6963f7d28e17f72"));
        assert!(!agg.is_conversation_table("Hello_Chat_x"));
    }

    #[test]
    fn test_read_table_maps_rows() {
        let map = contacts(&[("abc", "Alice")]);
        let agg = aggregator(&map);
        let conn = Connection::open_in_memory().unwrap();
        let table = format!("Chat_{}", md5_hex("abc"));
        create_chat_table(&conn, &table);
        conn.execute_batch(&format!(
            "INSERT INTO {t} (MesLocalID, CreateTime, Message, Type, Des) VALUES (2, 2000, 'yo', 1, 1);
             INSERT INTO {t} (MesLocalID, CreateTime, Message, Type, Des) VALUES (1, 1000, 'h' || char(0) || 'i', 1, 0);
             INSERT INTO {t} (MesLocalID, CreateTime, Message, Type, Des) VALUES (3, 3000, X'00FF10', 34, 0);
             INSERT INTO {t} (MesLocalID, CreateTime, Message, Type, Des) VALUES (4, 4000, NULL, 10000, 0);",
            t = quote_ident(&table)
        ))
        .unwrap();

        let messages = agg.read_table(&conn, &table, "Alice").unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);

        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[0].sender, "Alice");
        assert!(!messages[0].is_sender);
        assert_eq!(messages[1].sender, "Me");
        assert!(messages[1].is_sender);
        assert_eq!(messages[2].content, BINARY_CONTENT);
        assert_eq!(messages[2].msg_type, 34);
        assert_eq!(messages[3].content, "");
        assert_eq!(messages[3].msg_type, 10000);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_unknown_hash_gets_placeholder() {
        let agg = aggregator(&ContactMap::default());
        let (id, name, known) = agg.identity("deadbeef");
        assert!(!known);
        assert_eq!(id, "unknown:deadbeef");
        assert!(name.contains("Unknown") && name.contains("deadbeef"));
    }

    #[test]
    fn test_bad_table_does_not_stop_shard() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("message_1.sqlite");
        let conn = Connection::open(&path).unwrap();
        create_chat_table(&conn, "Chat_aaaa");
        conn.execute_batch(
            "INSERT INTO Chat_aaaa (MesLocalID, CreateTime, Message, Type, Des) VALUES (1, 5, 'ok', 1, 0);
             CREATE TABLE Chat_bbbb (Foo TEXT);
             INSERT INTO Chat_bbbb VALUES ('x');
             CREATE TABLE ChatExt2_aaaa (ConIntRes1 INTEGER);",
        )
        .unwrap();
        create_chat_table(&conn, "Chat_cccc");
        drop(conn);

        let agg = aggregator(&ContactMap::default());
        let mut report = AggregateReport::default();
        let conversations = agg.read_shard(&path, &mut report).unwrap();

        assert_eq!(report.tables, 3);
        assert_eq!(report.failed_tables, 1);
        assert_eq!(report.unknown_tables, 3);
        // Chat_cccc is empty and dropped
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].friend_id, "unknown:aaaa");
    }

    #[test]
    fn test_corrupt_shard_is_skipped_and_same_contact_merges() {
        let tmp = tempdir().unwrap();
        let map = contacts(&[("abc", "Alice")]);
        let table = format!("Chat_{}", md5_hex("abc"));

        let first = tmp.path().join("message_1.sqlite");
        let second = tmp.path().join("message_2.sqlite");
        for (path, time) in [(&first, 200), (&second, 100)] {
            let conn = Connection::open(path).unwrap();
            create_chat_table(&conn, &table);
            conn.execute(
                &format!(
                    "INSERT INTO {} (MesLocalID, CreateTime, Message, Type, Des) VALUES (?, ?, 'x', 1, 0)",
                    quote_ident(&table)
                ),
                [time, time],
            )
            .unwrap();
        }
        let corrupt = tmp.path().join("message_0.sqlite");
        std::fs::write(&corrupt, b"this is not a database file at all, just text padding").unwrap();

        let agg = aggregator(&map);
        let (conversations, report) = agg.aggregate(&[corrupt.clone(), first, second]);

        assert_eq!(report.failed_shards, vec![corrupt]);
        assert_eq!(conversations.len(), 1);
        let times: Vec<_> = conversations[0]
            .messages
            .iter()
            .map(|m| m.timestamp.timestamp())
            .collect();
        assert_eq!(times, vec![100, 200]);
        assert_eq!(report.messages, 2);
    }
}
