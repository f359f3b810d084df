//! Batch conversion of proprietary voice files via an external script

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::AudioConfig;

/// Extensions of files the converter accepts
const SOURCE_EXTENSIONS: &[&str] = &["aud", "silk"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready,
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The converter or one of its tools is missing; nothing was attempted
    Unavailable(String),
    Converted { converted: usize, failed: usize },
}

pub struct AudioConverter {
    script: PathBuf,
    format: String,
    concurrency: usize,
    required_tools: Vec<String>,
}

impl AudioConverter {
    pub fn new(script: PathBuf, format: &str, concurrency: usize) -> Self {
        Self {
            script,
            format: format.to_string(),
            concurrency: concurrency.max(1),
            required_tools: vec!["ffmpeg".to_string()],
        }
    }

    pub fn from_config(config: &AudioConfig, script: PathBuf) -> Self {
        Self::new(script, &config.format, config.concurrency)
    }

    /// Programs that must be on `PATH` besides the script itself
    pub fn with_required_tools(mut self, tools: Vec<String>) -> Self {
        self.required_tools = tools;
        self
    }

    pub fn check(&self) -> Availability {
        for tool in &self.required_tools {
            if !on_path(tool) {
                return Availability::Unavailable(format!("{} is not installed", tool));
            }
        }
        if !self.script.is_file() {
            return Availability::Unavailable(format!(
                "converter script not found: {}",
                self.script.display()
            ));
        }
        Availability::Ready
    }

    /// Source files in `dir` that have no converted sibling yet, sorted
    pub fn pending_files(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot scan audio directory");
                return vec![];
            }
        };

        let mut pending: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SOURCE_EXTENSIONS.contains(&e))
                    .unwrap_or(false)
            })
            .filter(|p| !p.with_extension(&self.format).exists())
            .collect();
        pending.sort();
        pending
    }

    /// Convert every pending file with at most `concurrency` conversions in
    /// flight. `progress` sees `(done, total)` after each file.
    pub async fn convert_dir<F>(&self, dir: &Path, progress: F) -> ConversionOutcome
    where
        F: Fn(usize, usize),
    {
        if let Availability::Unavailable(reason) = self.check() {
            return ConversionOutcome::Unavailable(reason);
        }
        if !dir.is_dir() {
            return ConversionOutcome::Converted {
                converted: 0,
                failed: 0,
            };
        }

        let pending = self.pending_files(dir);
        let total = pending.len();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for file in pending {
            let permits = Arc::clone(&permits);
            let script = self.script.clone();
            let format = self.format.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                let status = Command::new("sh")
                    .arg(&script)
                    .arg(&file)
                    .arg(&format)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await;
                match status {
                    Ok(s) if s.success() => Some(file),
                    Ok(s) => {
                        debug!(file = %file.display(), status = %s, "Conversion failed");
                        None
                    }
                    Err(e) => {
                        debug!(file = %file.display(), error = %e, "Converter did not start");
                        None
                    }
                }
            });
        }

        let mut done = 0;
        let mut converted = 0;
        while let Some(result) = tasks.join_next().await {
            done += 1;
            if matches!(result, Ok(Some(_))) {
                converted += 1;
            }
            progress(done, total);
        }

        ConversionOutcome::Converted {
            converted,
            failed: total - converted,
        }
    }

    /// [`convert_dir`](Self::convert_dir) on a private runtime
    pub fn convert_dir_blocking<F>(&self, dir: &Path, progress: F) -> Result<ConversionOutcome>
    where
        F: Fn(usize, usize),
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.concurrency.min(8))
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.convert_dir(dir, progress)))
    }
}

/// Whether an executable named `tool` exists in a `PATH` directory
pub fn on_path(tool: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(tool).is_file()))
        .unwrap_or(false)
}
