//! Parse command implementation

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::pipeline;

pub fn run(config: &Config, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input_dir = input.unwrap_or_else(|| config.extract_dir());
    let output_dir = output.unwrap_or_else(|| config.parse_dir());

    println!("🔎 Parsing databases in {}", input_dir.display());
    let report = pipeline::parse(&input_dir, &output_dir, config)?;
    let agg = &report.aggregate;

    println!("   Contacts loaded:   {}", report.contacts);
    println!("   Shards read:       {}/{}", agg.shards - agg.failed_shards.len(), agg.shards);
    for failed in &agg.failed_shards {
        println!("     ✗ {}", failed.display());
    }
    println!("   Tables scanned:    {}", agg.tables);
    if agg.failed_tables > 0 {
        println!("   Tables skipped:    {}", agg.failed_tables);
    }
    if agg.unknown_tables > 0 {
        println!("   Unknown contacts:  {}", agg.unknown_tables);
    }
    println!("   Messages parsed:   {}", agg.messages);

    println!(
        "\n✅ Wrote {} conversations to {}",
        report.index.len(),
        output_dir.display()
    );
    Ok(())
}
