//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::documents::ChunkingStrategy;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Local embedding server and content ingestion
#[derive(Parser, Debug)]
#[command(
    name = "embedex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local embedding server and content ingestion",
    long_about = "Serve text embeddings over HTTP and embed a content directory into a JSON index.",
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ embedex init                 # Write .embedex/settings.toml\n  $ embedex serve                # POST /embed on 127.0.0.1:8000\n  $ embedex ingest               # content/ -> data/index.json"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .embedex directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Start the embed server
    #[command(
        about = "Start the HTTP embed server",
        after_help = "Examples:\n  embedex serve\n  embedex serve --bind 0.0.0.0:8000\n  embedex serve --model BAAI/bge-small-en-v1.5\n\nRequest:\n  curl -s localhost:8000/embed -d '{\"text\":\"hello\"}'"
    )]
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// Embedding model (overrides the active backend's model)
        #[arg(long)]
        model: Option<String>,
    },

    /// Embed a content directory into the JSON index
    #[command(about = "Chunk and embed files into the JSON index")]
    Ingest(IngestArgs),

    /// Embed a single text and print the vector
    #[command(about = "Print the embedding of TEXT as JSON")]
    Embed {
        /// Text to embed
        text: String,

        /// Embedding model (overrides the active backend's model)
        #[arg(long)]
        model: Option<String>,
    },
}

/// Overrides for `ingest`; unset flags fall back to settings.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct IngestArgs {
    /// Directory to read files from
    #[arg(long, value_name = "DIR")]
    pub content_dir: Option<PathBuf>,

    /// Directory the index is written to
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Maximum chunk length in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared between consecutive chunks
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Chunking strategy: window or sections
    #[arg(long)]
    pub strategy: Option<ChunkingStrategy>,

    /// Texts per embedding call
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
