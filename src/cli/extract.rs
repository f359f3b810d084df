//! Extract command implementation

use anyhow::Result;
use std::path::PathBuf;

use crate::backup::{self, locate_backups, FileKind};
use crate::config::Config;
use crate::error::KeepsakeError;

pub fn run(
    config: &Config,
    backup_path: Option<PathBuf>,
    output: Option<PathBuf>,
    include_audio: bool,
) -> Result<()> {
    let backup_root = match backup_path {
        Some(path) => path,
        None => {
            let newest = locate_backups(&config.search_roots(), &config.backup.manifest_file)
                .into_iter()
                .next()
                .ok_or(KeepsakeError::NoBackups)?;
            println!(
                "Using newest backup: {} ({})",
                newest.path.display(),
                newest.modified.format("%Y-%m-%d %H:%M:%S")
            );
            newest.path
        }
    };
    let output_dir = output.unwrap_or_else(|| config.extract_dir());

    println!("📦 Reading manifest from {}", backup_root.display());
    let report = backup::extract_from_backup(&backup_root, &output_dir, config, include_audio)?;

    println!("   Contact databases: {}", report.count(FileKind::ContactDatabase));
    println!("   Legacy databases:  {}", report.count(FileKind::LegacyDatabase));
    println!("   Message shards:    {}", report.count(FileKind::MessageShard));
    if include_audio {
        println!("   Voice notes:       {}", report.count(FileKind::VoiceNote));
    }
    if report.skipped > 0 {
        println!("   Skipped:           {} (missing or unreadable in backup)", report.skipped);
    }

    println!("\n✅ Extracted {} files to {}", report.extracted.len(), output_dir.display());
    Ok(())
}
