//! Voice note commands: conversion and transcription

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::audio::{annotate_conversation, AudioConverter, CommandTranscriber, ConversionOutcome};
use crate::config::Config;
use crate::error::KeepsakeError;
use crate::store::ChatStore;

pub fn convert(config: &Config, dir: &Path) -> Result<()> {
    let converter = AudioConverter::from_config(&config.audio, config.converter_script());

    println!("🎙  Converting voice notes in {}", dir.display());
    let outcome = converter.convert_dir_blocking(dir, |done, total| {
        if done == total || done % 50 == 0 {
            println!("   {}/{}", done, total);
        }
    })?;

    match outcome {
        ConversionOutcome::Unavailable(reason) => {
            println!("Converter unavailable: {}", reason);
        }
        ConversionOutcome::Converted { converted, failed } => {
            println!("\n✅ Converted {} files ({} failed)", converted, failed);
        }
    }
    Ok(())
}

pub fn transcribe(config: &Config, dir: Option<PathBuf>, friend: &str, audio_dir: &Path) -> Result<()> {
    let store = ChatStore::new(dir.unwrap_or_else(|| config.parse_dir()));
    let entry = store
        .find(friend)?
        .ok_or_else(|| KeepsakeError::ConversationNotFound(friend.to_string()))?;
    let mut conversation = store.load_conversation(&entry.file_uuid)?;

    let transcriber = CommandTranscriber::from_config(&config.transcribe);
    println!("📝 Transcribing voice notes for {}", conversation.friend_name);
    let count = annotate_conversation(&mut conversation, audio_dir, &config.audio.format, &transcriber);

    if count > 0 {
        store.save_conversation(&conversation)?;
    }
    println!("\n✅ Transcribed {} messages", count);
    Ok(())
}
