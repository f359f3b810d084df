//! Speech-to-text annotation of voice messages

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::process::Command;
use tracing::warn;

use crate::chat::{Conversation, MessageKind};
use crate::config::TranscribeConfig;

/// Prefix put in front of a transcript when it replaces message content
pub const VOICE_PREFIX: &str = "[Voice]";

/// Turns one audio file into text
pub trait Transcriber {
    fn transcribe(&self, audio: &Path) -> Result<String>;
}

/// Runs an external program and reads the transcript from its stdout
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    /// `{input}` in `args` is replaced with the audio path
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }

    pub fn from_config(config: &TranscribeConfig) -> Self {
        Self::new(&config.program, config.args.clone())
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, audio: &Path) -> Result<String> {
        let input = audio.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{input}", &input))
            .collect();

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run {}", self.program))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Transcribe voice messages that have audio at `<audio_dir>/<id>.<extension>`
/// and no transcription yet. Sets `transcription` and rewrites `content`.
/// Returns how many messages were annotated; failures are logged and skipped.
pub fn annotate_conversation(
    conversation: &mut Conversation,
    audio_dir: &Path,
    extension: &str,
    transcriber: &dyn Transcriber,
) -> usize {
    let available: HashSet<String> = match std::fs::read_dir(audio_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect(),
        Err(e) => {
            warn!(dir = %audio_dir.display(), error = %e, "Cannot read audio directory");
            return 0;
        }
    };

    let mut annotated = 0;
    for message in conversation.messages.iter_mut() {
        if message.kind() != MessageKind::Voice
            || message.transcription.is_some()
            || message.id.is_empty()
        {
            continue;
        }

        let file_name = format!("{}.{}", message.id, extension);
        if !available.contains(&file_name) {
            continue;
        }

        match transcriber.transcribe(&audio_dir.join(&file_name)) {
            Ok(text) => {
                message.content = format!("{} {}", VOICE_PREFIX, text);
                message.transcription = Some(text);
                annotated += 1;
            }
            Err(e) => warn!(file = %file_name, error = %e, "Transcription failed"),
        }
    }

    annotated
}
