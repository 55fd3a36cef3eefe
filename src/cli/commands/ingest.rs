//! Ingest command - embed the content directory into the JSON index.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::IngestArgs;
use crate::config::Settings;
use crate::indexing::{IngestOptions, IngestProgress, Ingestor};
use crate::semantic;

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}";

/// Fold CLI overrides into the settings and re-validate.
pub fn apply_overrides(config: &mut Settings, args: &IngestArgs) -> anyhow::Result<()> {
    if let Some(dir) = &args.content_dir {
        config.ingest.content_dir = dir.clone();
    }
    if let Some(dir) = &args.out_dir {
        config.ingest.out_dir = dir.clone();
    }
    if let Some(size) = args.chunk_size {
        config.chunking.chunk_size = size;
    }
    if let Some(overlap) = args.overlap {
        config.chunking.overlap = overlap;
    }
    if let Some(strategy) = args.strategy {
        config.chunking.strategy = strategy;
    }
    if let Some(batch_size) = args.batch_size {
        config.embedding.batch_size = batch_size;
    }
    if args.no_progress {
        config.ingest.show_progress = false;
    }

    config.validate()?;
    Ok(())
}

/// Run the ingest command.
pub async fn run(args: IngestArgs, mut config: Settings) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args)?;

    eprintln!("Loading embedding backend ({:?}) ...", config.embedding.backend);
    let generator = semantic::from_settings(&config.embedding)
        .await
        .context("failed to initialize embedding backend")?;
    eprintln!("Model ready: {}", generator.model_name());

    let ingestor = Ingestor::new(generator, IngestOptions::from_settings(&config))?;

    let show_progress = config.ingest.show_progress;
    let mut bar: Option<ProgressBar> = None;
    let report = ingestor
        .run_with_progress(|event| match event {
            IngestProgress::Started { chunks, .. } if show_progress && chunks > 0 => {
                let pb = ProgressBar::new(chunks as u64);
                if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
                    pb.set_style(style.progress_chars("=> "));
                }
                bar = Some(pb);
            }
            IngestProgress::ChunkEmbedded { source, .. } => {
                if let Some(pb) = &bar {
                    pb.set_message(source.to_string());
                    pb.inc(1);
                }
            }
            IngestProgress::Started { .. } => {}
        })
        .await;

    if let Some(pb) = bar {
        pb.finish_and_clear();
    }
    let report = report?;

    if report.files == 0 {
        eprintln!(
            "No files found in '{}'.",
            config.ingest.content_dir.display()
        );
    }
    println!(
        "Wrote {} with {} chunks from {} files",
        report.out_path.display(),
        report.chunks,
        report.files
    );
    Ok(())
}
