//! Parsed output on disk
//!
//! ```text
//! <root>/index.json            [{friend_id, friend_name, message_count, file_uuid}, ...]
//! <root>/chats/<md5(id)>.json  {friend_id, friend_name, messages: [...]}
//! <root>/exports/wechat_<name>.{json,txt}
//! ```
//!
//! Every write replaces whole files, so rerunning a parse over unchanged input
//! reproduces the same bytes. Single conversations can be loaded and saved
//! without touching the rest.

mod export;

pub use export::{render_text, safe_file_stem, select_messages, ExportFormat, ExportOptions};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::chat::{Conversation, IndexEntry};
use crate::digest::md5_hex;
use crate::error::KeepsakeError;

const INDEX_FILE: &str = "index.json";
const CHATS_DIR: &str = "chats";

pub struct ChatStore {
    root: PathBuf,
}

impl ChatStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn chats_dir(&self) -> PathBuf {
        self.root.join(CHATS_DIR)
    }

    pub fn chat_path(&self, file_key: &str) -> PathBuf {
        self.chats_dir().join(format!("{}.json", file_key))
    }

    /// Stable, filesystem-safe key for a conversation
    pub fn file_key(friend_id: &str) -> String {
        md5_hex(friend_id)
    }

    pub fn exists(&self) -> bool {
        self.index_path().exists()
    }

    // ============================================
    // WRITING
    // ============================================

    /// Write every conversation and the index, replacing earlier output
    pub fn write_all(&self, conversations: &[Conversation]) -> Result<Vec<IndexEntry>> {
        fs::create_dir_all(self.chats_dir())
            .with_context(|| format!("Failed to create {}", self.chats_dir().display()))?;

        let mut index = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let file_key = self.save_conversation(conversation)?;
            index.push(IndexEntry {
                friend_id: conversation.friend_id.clone(),
                friend_name: conversation.friend_name.clone(),
                message_count: conversation.messages.len(),
                file_uuid: file_key,
            });
        }

        write_json(&self.index_path(), &index)?;
        Ok(index)
    }

    /// Rewrite one conversation's file; returns its key
    pub fn save_conversation(&self, conversation: &Conversation) -> Result<String> {
        let file_key = Self::file_key(&conversation.friend_id);
        let path = self.chat_path(&file_key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json(&path, conversation)?;
        Ok(file_key)
    }

    // ============================================
    // READING
    // ============================================

    pub fn load_index(&self) -> Result<Vec<IndexEntry>> {
        read_json(&self.index_path())
    }

    pub fn load_conversation(&self, file_key: &str) -> Result<Conversation> {
        let path = self.chat_path(file_key);
        if !path.exists() {
            return Err(KeepsakeError::ConversationNotFound(file_key.to_string()).into());
        }
        read_json(&path)
    }

    /// Index entry by file key, friend id, or exact friend name (in that order)
    pub fn find(&self, query: &str) -> Result<Option<IndexEntry>> {
        let index = self.load_index()?;
        let found = index
            .iter()
            .find(|e| e.file_uuid == query)
            .or_else(|| index.iter().find(|e| e.friend_id == query))
            .or_else(|| index.iter().find(|e| e.friend_name == query))
            .cloned();
        Ok(found)
    }

    /// Entries sorted by message count (descending), optionally filtered by a
    /// case-insensitive substring of the friend name or id
    pub fn search(&self, query: Option<&str>) -> Result<Vec<IndexEntry>> {
        let needle = query.map(str::to_lowercase);
        let mut entries: Vec<IndexEntry> = self
            .load_index()?
            .into_iter()
            .filter(|e| match &needle {
                Some(n) => {
                    e.friend_name.to_lowercase().contains(n)
                        || e.friend_id.to_lowercase().contains(n)
                }
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| b.message_count.cmp(&a.message_count));
        Ok(entries)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}
