//! Export command implementation

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::KeepsakeError;
use crate::store::{ChatStore, ExportOptions};

pub fn run(config: &Config, dir: Option<PathBuf>, friend: &str, options: ExportOptions) -> Result<()> {
    let store = ChatStore::new(dir.unwrap_or_else(|| config.parse_dir()));
    let entry = store
        .find(friend)?
        .ok_or_else(|| KeepsakeError::ConversationNotFound(friend.to_string()))?;
    let conversation = store.load_conversation(&entry.file_uuid)?;

    let (path, count) = store.export(&conversation, &options)?;

    println!(
        "✅ Exported {} of {} messages with {}",
        count,
        conversation.messages.len(),
        conversation.friend_name
    );
    println!("   {}", path.display());
    Ok(())
}
