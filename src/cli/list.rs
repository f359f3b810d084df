//! List command implementation

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::store::ChatStore;

pub fn run(config: &Config, dir: Option<PathBuf>, search: Option<String>, limit: usize) -> Result<()> {
    let store = ChatStore::new(dir.unwrap_or_else(|| config.parse_dir()));

    if !store.exists() {
        println!("No index found in {}. Run 'keepsake parse' first.", store.root().display());
        return Ok(());
    }

    let entries = store.search(search.as_deref())?;
    if entries.is_empty() {
        println!("No conversations match.");
        return Ok(());
    }

    println!("{:<34} {:>8}  {:<30} {}", "File", "Messages", "Name", "ID");
    println!("{}", "-".repeat(100));

    for entry in entries.iter().take(limit) {
        println!(
            "{:<34} {:>8}  {:<30} {}",
            entry.file_uuid,
            entry.message_count,
            truncate(&entry.friend_name, 30),
            entry.friend_id,
        );
    }

    if entries.len() > limit {
        println!("... {} more (use --limit)", entries.len() - limit);
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
