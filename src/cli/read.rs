//! Read command implementation

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::KeepsakeError;
use crate::store::ChatStore;

pub fn run(config: &Config, dir: Option<PathBuf>, friend: &str, search: Option<String>) -> Result<()> {
    let store = ChatStore::new(dir.unwrap_or_else(|| config.parse_dir()));
    let entry = store
        .find(friend)?
        .ok_or_else(|| KeepsakeError::ConversationNotFound(friend.to_string()))?;
    let conversation = store.load_conversation(&entry.file_uuid)?;

    println!("\n{}", "=".repeat(80));
    println!("Chat with: {}", conversation.friend_name);
    println!(
        "ID: {} | File: {}.json | Messages: {}",
        conversation.friend_id,
        entry.file_uuid,
        conversation.messages.len()
    );
    println!("{}", "=".repeat(80));

    let needle = search.as_deref().map(str::to_lowercase);
    let mut shown = 0;
    for msg in &conversation.messages {
        if let Some(n) = &needle {
            if !msg.content.to_lowercase().contains(n) {
                continue;
            }
        }
        shown += 1;
        println!(
            "[{}] {} ({}): {}",
            msg.timestamp.format("%Y-%m-%d %H:%M:%S"),
            msg.sender,
            msg.kind().label(),
            msg.content
        );
    }

    if let Some(query) = &search {
        println!("\n{} messages matched '{}'", shown, query);
    }

    Ok(())
}
