//! Single-conversation export
//!
//! Writes one conversation, optionally narrowed by a content search and with
//! voice messages left out, to `<root>/exports/` as JSON or plain text.

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::ValueEnum;
use std::fs;
use std::path::PathBuf;

use super::{write_json, ChatStore};
use crate::chat::{Conversation, MessageKind};

const EXPORTS_DIR: &str = "exports";
const FILE_PREFIX: &str = "wechat_";
const MAX_NAME_CHARS: usize = 50;
const FALLBACK_NAME: &str = "unknown_friend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Txt,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Case-insensitive substring the content must contain
    pub search: Option<String>,
    pub include_voice: bool,
    pub format: ExportFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            search: None,
            include_voice: true,
            format: ExportFormat::Json,
        }
    }
}

/// Copy of `conversation` holding only the messages `options` keep
pub fn select_messages(conversation: &Conversation, options: &ExportOptions) -> Conversation {
    let needle = options.search.as_deref().map(str::to_lowercase);
    let messages = conversation
        .messages
        .iter()
        .filter(|m| options.include_voice || m.kind() != MessageKind::Voice)
        .filter(|m| match &needle {
            Some(n) => m.content.to_lowercase().contains(n),
            None => true,
        })
        .cloned()
        .collect();

    Conversation {
        friend_id: conversation.friend_id.clone(),
        friend_name: conversation.friend_name.clone(),
        messages,
    }
}

/// Display name reduced to word characters, whitespace and `-`, with
/// whitespace runs collapsed and the length capped
pub fn safe_file_stem(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_NAME_CHARS).collect();

    if capped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        capped
    }
}

/// Plain-text rendering: a header, then `[timestamp] sender: content` lines
pub fn render_text(conversation: &Conversation, search: Option<&str>) -> String {
    let mut out = format!("Chat History with {}\n", conversation.friend_name);
    if let Some(query) = search {
        out.push_str(&format!("Filter: {}\n", query));
    }
    out.push('\n');

    for msg in &conversation.messages {
        out.push_str(&format!(
            "[{}] {}: {}\n",
            msg.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            msg.sender,
            msg.content
        ));
    }
    out
}

impl ChatStore {
    pub fn exports_dir(&self) -> PathBuf {
        self.root.join(EXPORTS_DIR)
    }

    pub fn export_path(&self, friend_name: &str, format: ExportFormat) -> PathBuf {
        self.exports_dir().join(format!(
            "{}{}.{}",
            FILE_PREFIX,
            safe_file_stem(friend_name),
            format.extension()
        ))
    }

    /// Write the selected part of `conversation` under `exports/`, replacing
    /// an earlier export of the same name. Returns the written path and the
    /// number of messages in it.
    pub fn export(&self, conversation: &Conversation, options: &ExportOptions) -> Result<(PathBuf, usize)> {
        let selected = select_messages(conversation, options);
        let dir = self.exports_dir();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = self.export_path(&conversation.friend_name, options.format);
        match options.format {
            ExportFormat::Json => write_json(&path, &selected)?,
            ExportFormat::Txt => {
                let text = render_text(&selected, options.search.as_deref());
                fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }

        Ok((path, selected.messages.len()))
    }
}
