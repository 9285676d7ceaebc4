//! Tubescript - YouTube transcripts as Markdown documents
//!
//! Fetches a video's captions through the captioning service or yt-dlp, adds
//! whatever metadata is available and prints a single document to stdout.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tubescript::app::response_text;
use tubescript::{AppSettings, TranscriptRequest, TranscriptService};

#[derive(Parser)]
#[command(name = "tubescript", version, about = "Fetch a YouTube transcript as Markdown")]
struct Args {
    /// Video URL or 11-character video ID
    url: String,

    /// Preferred transcript language, repeatable (most preferred first)
    #[arg(short = 'l', long = "lang")]
    languages: Vec<String>,

    /// Prefix each line with an [MM:SS] timecode
    #[arg(short = 't', long)]
    timestamps: bool,

    /// Skip metadata lookups
    #[arg(long)]
    no_metadata: bool,

    /// Settings file (defaults to the per-user config location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = Arc::new(AppSettings::load(args.config.as_deref())?);
    let service = TranscriptService::from_settings(settings)?;

    let request = TranscriptRequest {
        url: args.url,
        languages: (!args.languages.is_empty()).then_some(args.languages),
        include_timestamps: args.timestamps,
        include_metadata: !args.no_metadata,
    };

    let result = service.get_transcript(&request).await;
    let exit_code = if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };
    println!("{}", response_text(result).trim_end_matches('\n'));
    Ok(exit_code)
}

/// Logs go to stderr so stdout only ever carries the response text
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter)
        .init();
}
