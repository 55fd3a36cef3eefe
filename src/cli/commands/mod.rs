//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod embed;
pub mod ingest;
pub mod init;
pub mod serve;

use crate::config::{EmbeddingBackend, EmbeddingConfig};

/// Point the active backend at `model`.
///
/// The http backend has no model of its own; the override is ignored there.
pub fn apply_model_override(config: &mut EmbeddingConfig, model: Option<String>) {
    let Some(model) = model else {
        return;
    };
    match config.backend {
        EmbeddingBackend::Local => config.model = model,
        EmbeddingBackend::OpenAi => config.openai.model = model,
        EmbeddingBackend::Http => {
            tracing::warn!("--model {model} ignored: the http backend uses the server's model");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_override_targets_active_backend() {
        let mut config = EmbeddingConfig::default();
        apply_model_override(&mut config, Some("BGESmallENV15".to_string()));
        assert_eq!(config.model, "BGESmallENV15");

        config.backend = EmbeddingBackend::OpenAi;
        apply_model_override(&mut config, Some("text-embedding-3-large".to_string()));
        assert_eq!(config.openai.model, "text-embedding-3-large");
        assert_eq!(config.model, "BGESmallENV15");

        apply_model_override(&mut config, None);
        assert_eq!(config.openai.model, "text-embedding-3-large");
    }
}
