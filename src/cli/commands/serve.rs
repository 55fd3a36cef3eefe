//! Serve command - HTTP embed server.

use anyhow::Context;

use crate::config::Settings;
use crate::semantic;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub bind: Option<String>,
    pub model: Option<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, mut config: Settings) -> anyhow::Result<()> {
    let ServeArgs { bind, model } = args;

    // CLI flag wins over config
    let bind_address = bind.unwrap_or_else(|| config.server.bind.clone());
    super::apply_model_override(&mut config.embedding, model);

    eprintln!("Loading embedding backend ({:?}) ...", config.embedding.backend);
    let generator = semantic::from_settings(&config.embedding)
        .await
        .context("failed to initialize embedding backend")?;
    eprintln!("Model ready: {}", generator.model_name());

    crate::server::serve(&bind_address, generator).await
}
