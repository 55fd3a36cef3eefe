use anyhow::Context;
use clap::Parser;

use embedex::Settings;
use embedex::cli::commands::{embed, ingest, init, serve};
use embedex::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Init must work without (or with a broken) settings file
    if let Commands::Init { force } = cli.command {
        embedex::logging::init();
        let root = std::env::current_dir().context("cannot determine current directory")?;
        return init::run_init(&root, force);
    }

    let config = load_settings(&cli)?;
    embedex::logging::init_with_config(&config.logging);

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Config => init::run_config(&config),
        Commands::Serve { bind, model } => {
            serve::run(serve::ServeArgs { bind, model }, config).await
        }
        Commands::Ingest(args) => ingest::run(args, config).await,
        Commands::Embed { text, model } => embed::run(&text, model, config).await,
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    match &cli.config {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("configuration file not found: {}", path.display());
            }
            Settings::load_from(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))
        }
        None => Settings::load().context("failed to load configuration"),
    }
}
