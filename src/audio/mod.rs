//! Voice note collaborators: codec conversion and transcription
//!
//! Both wrap external programs. Voice notes are linked to messages by file
//! stem: `<message id>.<ext>`.

mod convert;
mod transcribe;

pub use convert::{on_path, AudioConverter, Availability, ConversionOutcome};
pub use transcribe::{annotate_conversation, CommandTranscriber, Transcriber, VOICE_PREFIX};
