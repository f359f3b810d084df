//! Precondition failures that stop a run before any side effect

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeepsakeError {
    #[error("no backups found under any search root")]
    NoBackups,

    #[error("input directory not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("manifest {} not found in backup", .0.display())]
    ManifestMissing(PathBuf),

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),
}
