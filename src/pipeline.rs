//! Parse stage: extracted databases -> normalized conversations on disk

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chat::{AggregateReport, Aggregator, IndexEntry};
use crate::config::Config;
use crate::contacts::ContactResolver;
use crate::error::KeepsakeError;
use crate::store::ChatStore;
use crate::workdir;

/// Counts from one parse run
#[derive(Debug)]
pub struct ParseReport {
    pub contacts: usize,
    pub shards: Vec<PathBuf>,
    pub aggregate: AggregateReport,
    pub index: Vec<IndexEntry>,
}

/// Shard databases under an extraction directory
pub fn find_shards(input_dir: &Path, config: &Config) -> Vec<PathBuf> {
    let marker = &config.patterns.shard_marker;
    let suffix = &config.patterns.database_suffix;
    workdir::find_files(input_dir, |name| name.contains(marker.as_str()) && name.ends_with(suffix.as_str()))
}

/// Resolve contacts, aggregate every shard, write the output store.
/// Contacts are fully resolved before any shard is read.
pub fn parse(input_dir: &Path, output_dir: &Path, config: &Config) -> Result<ParseReport> {
    if !input_dir.is_dir() {
        return Err(KeepsakeError::InputMissing(input_dir.to_path_buf()).into());
    }

    let contacts = ContactResolver::new(input_dir, config).resolve();
    info!(contacts = contacts.len(), "Contacts resolved");

    let shards = find_shards(input_dir, config);
    info!(shards = shards.len(), "Found message shards");

    let aggregator = Aggregator::new(&contacts, &config.chat);
    let (conversations, aggregate) = aggregator.aggregate(&shards);

    let index = ChatStore::new(output_dir).write_all(&conversations)?;

    Ok(ParseReport {
        contacts: contacts.len(),
        shards,
        aggregate,
        index,
    })
}
