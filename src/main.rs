use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use keepsake::cli::{audio, backups, export, extract, list, parse, read};
use keepsake::config::Config;
use keepsake::logging;
use keepsake::store::{ExportFormat, ExportOptions};

#[derive(Parser)]
#[command(name = "keepsake")]
#[command(about = "Chat history extraction from iOS device backups")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "keepsake.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered backups, newest first
    Backups,

    /// Copy the app's databases out of a backup
    Extract {
        /// Backup directory (default: newest discovered)
        #[arg(short, long)]
        backup: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also extract voice notes
        #[arg(long)]
        audio: bool,
    },

    /// Build conversations from extracted databases
    Parse {
        /// Directory holding extracted databases
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for index.json and chats/
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List parsed conversations
    List {
        /// Filter by name or ID
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum rows to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Parsed output directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Read a conversation
    Read {
        /// File key, friend ID or friend name
        friend: String,

        /// Only show messages containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Parsed output directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Write a conversation to <dir>/exports/ as JSON or text
    Export {
        /// File key, friend ID or friend name
        friend: String,

        /// Only export messages containing this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Leave out voice messages
        #[arg(long)]
        no_voice: bool,

        /// Parsed output directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Convert voice notes in a directory to a standard audio format
    ConvertAudio {
        /// Directory of .aud/.silk files
        dir: PathBuf,
    },

    /// Transcribe a conversation's voice notes
    Transcribe {
        /// File key, friend ID or friend name
        friend: String,

        /// Directory of converted audio files
        #[arg(short, long = "audio")]
        audio_dir: PathBuf,

        /// Parsed output directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config)?;
    logging::init(&config.logging.level)?;

    match cli.command {
        Commands::Backups => {
            backups::run(&config)?;
        }
        Commands::Extract {
            backup,
            output,
            audio: with_audio,
        } => {
            extract::run(&config, backup, output, with_audio)?;
        }
        Commands::Parse { input, output } => {
            parse::run(&config, input, output)?;
        }
        Commands::List { search, limit, dir } => {
            list::run(&config, dir, search, limit)?;
        }
        Commands::Read {
            friend,
            search,
            dir,
        } => {
            read::run(&config, dir, &friend, search)?;
        }
        Commands::Export {
            friend,
            search,
            format,
            no_voice,
            dir,
        } => {
            let options = ExportOptions {
                search,
                include_voice: !no_voice,
                format,
            };
            export::run(&config, dir, &friend, options)?;
        }
        Commands::ConvertAudio { dir } => {
            audio::convert(&config, &dir)?;
        }
        Commands::Transcribe {
            friend,
            audio_dir,
            dir,
        } => {
            audio::transcribe(&config, dir, &friend, &audio_dir)?;
        }
    }

    Ok(())
}
