//! Embed command - print one embedding.

use anyhow::Context;

use crate::config::Settings;
use crate::semantic;

pub async fn run(text: &str, model: Option<String>, mut config: Settings) -> anyhow::Result<()> {
    super::apply_model_override(&mut config.embedding, model);

    let generator = semantic::from_settings(&config.embedding)
        .await
        .context("failed to initialize embedding backend")?;
    let embedding = generator.embed(text).await?;

    tracing::debug!(
        target: "semantic",
        "{} dimensions from {}",
        embedding.len(),
        generator.model_name()
    );
    println!("{}", serde_json::json!({ "embedding": embedding }));
    Ok(())
}
