//! Backups command implementation

use anyhow::Result;

use crate::backup::locate_backups;
use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let backups = locate_backups(&config.search_roots(), &config.backup.manifest_file);

    if backups.is_empty() {
        println!("No backups found. Searched:");
        for root in config.search_roots() {
            println!("  {}", root.display());
        }
        return Ok(());
    }

    println!("{:<20} {}", "Modified", "Path");
    println!("{}", "-".repeat(80));
    for backup in backups {
        println!(
            "{:<20} {}",
            backup.modified.format("%Y-%m-%d %H:%M:%S"),
            backup.path.display()
        );
    }

    Ok(())
}
