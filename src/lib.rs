pub mod audio;
pub mod backup;
pub mod chat;
pub mod cli;
pub mod config;
pub mod contacts;
mod digest;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod store;
mod workdir;

pub use config::Config;
pub use contacts::{ContactMap, ContactResolver, ContactSource};
pub use digest::md5_hex;
pub use error::KeepsakeError;
pub use store::ChatStore;
