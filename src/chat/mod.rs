//! Normalized conversation model and the shard aggregator that builds it

mod aggregate;

pub use aggregate::{AggregateReport, Aggregator, BINARY_CONTENT};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Known message type codes. Anything else passes through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Sticker,
    AppMessage,
    Other(i64),
}

impl MessageKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MessageKind::Text,
            3 => MessageKind::Image,
            34 => MessageKind::Voice,
            47 => MessageKind::Sticker,
            49 => MessageKind::AppMessage,
            other => MessageKind::Other(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            MessageKind::Text => 1,
            MessageKind::Image => 3,
            MessageKind::Voice => 34,
            MessageKind::Sticker => 47,
            MessageKind::AppMessage => 49,
            MessageKind::Other(code) => *code,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Voice => "voice",
            MessageKind::Sticker => "sticker",
            MessageKind::AppMessage => "app",
            MessageKind::Other(_) => "other",
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within its conversation; voice media is named after it
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub content: String,
    /// Raw type code from the source row
    #[serde(rename = "type")]
    pub msg_type: i64,
    pub is_sender: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        MessageKind::from_code(self.msg_type)
    }
}

/// All messages exchanged with one contact or group, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub friend_id: String,
    pub friend_name: String,
    pub messages: Vec<Message>,
}

/// Summary row of `index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub friend_id: String,
    pub friend_name: String,
    pub message_count: usize,
    pub file_uuid: String,
}
