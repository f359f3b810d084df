//! Command implementations

pub mod audio;
pub mod backups;
pub mod export;
pub mod extract;
pub mod list;
pub mod parse;
pub mod read;
