//! Configuration management with YAML support

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub patterns: PatternConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub transcribe: TranscribeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where backups live and which app inside them we read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_search_roots")]
    pub search_roots: Vec<String>,

    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    #[serde(default = "default_domain")]
    pub domain: String,
}

/// Case-sensitive path fragments matched against manifest rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_contact_db")]
    pub contact_db: String,

    #[serde(default = "default_legacy_db")]
    pub legacy_db: String,

    #[serde(default = "default_shard_marker")]
    pub shard_marker: String,

    #[serde(default = "default_database_suffix")]
    pub database_suffix: String,

    #[serde(default = "default_voice_suffix")]
    pub voice_suffix: String,
}

/// Conversation table naming inside shard databases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    #[serde(default = "default_aux_table_prefix")]
    pub aux_table_prefix: String,

    #[serde(default = "default_self_sender")]
    pub self_sender: String,
}

/// Working directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_extract_dir")]
    pub extract_dir: String,

    #[serde(default = "default_parse_dir")]
    pub parse_dir: String,
}

/// External voice codec converter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_converter_script")]
    pub converter_script: String,

    #[serde(default = "default_audio_format")]
    pub format: String,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// External speech-to-text command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeConfig {
    #[serde(default = "default_transcribe_program")]
    pub program: String,

    /// `{input}` is replaced with the audio file path
    #[serde(default = "default_transcribe_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_search_roots() -> Vec<String> {
    vec![
        "~/Library/Application Support/MobileSync/Backup".to_string(),
        "~/Downloads".to_string(),
    ]
}

fn default_manifest_file() -> String {
    "Manifest.db".to_string()
}

fn default_domain() -> String {
    "AppDomain-com.tencent.xin".to_string()
}

fn default_contact_db() -> String {
    "WCDB_Contact.sqlite".to_string()
}

fn default_legacy_db() -> String {
    "MM.sqlite".to_string()
}

fn default_shard_marker() -> String {
    "message_".to_string()
}

fn default_database_suffix() -> String {
    ".sqlite".to_string()
}

fn default_voice_suffix() -> String {
    ".aud".to_string()
}

fn default_table_prefix() -> String {
    "Chat_".to_string()
}

fn default_aux_table_prefix() -> String {
    "ChatExt".to_string()
}

fn default_self_sender() -> String {
    "Me".to_string()
}

fn default_extract_dir() -> String {
    "extracted_db".to_string()
}

fn default_parse_dir() -> String {
    "parsed_data".to_string()
}

fn default_converter_script() -> String {
    "silk-v3-decoder/converter.sh".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_concurrency() -> usize {
    8
}

fn default_transcribe_program() -> String {
    "whisper-cli".to_string()
}

fn default_transcribe_args() -> Vec<String> {
    vec!["--no-timestamps".to_string(), "-f".to_string(), "{input}".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            search_roots: default_search_roots(),
            manifest_file: default_manifest_file(),
            domain: default_domain(),
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            contact_db: default_contact_db(),
            legacy_db: default_legacy_db(),
            shard_marker: default_shard_marker(),
            database_suffix: default_database_suffix(),
            voice_suffix: default_voice_suffix(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            table_prefix: default_table_prefix(),
            aux_table_prefix: default_aux_table_prefix(),
            self_sender: default_self_sender(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extract_dir: default_extract_dir(),
            parse_dir: default_parse_dir(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            converter_script: default_converter_script(),
            format: default_audio_format(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            program: default_transcribe_program(),
            args: default_transcribe_args(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./keepsake.yaml (current directory)
    /// 3. ~/.config/keepsake/keepsake.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "keepsake.yaml".to_string(),
            shellexpand::tilde("~/.config/keepsake/keepsake.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)
                    .with_context(|| format!("Failed to read config {}", search_path))?;
                let config: Config = serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse config {}", search_path))?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Backup search roots with `~` expanded
    pub fn search_roots(&self) -> Vec<PathBuf> {
        self.backup.search_roots.iter().map(|r| expand(r)).collect()
    }

    pub fn extract_dir(&self) -> PathBuf {
        expand(&self.output.extract_dir)
    }

    pub fn parse_dir(&self) -> PathBuf {
        expand(&self.output.parse_dir)
    }

    pub fn converter_script(&self) -> PathBuf {
        expand(&self.audio.converter_script)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
