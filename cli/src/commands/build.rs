use anyhow::{Context, Result};
use defraud_config::{Credentials, Requirements, Validate};
use defraud_context::select_embedder;
use defraud_core::dataset::read_records;
use defraud_core::CorpusIngestor;
use defraud_index::{IndexBuilder, IndexPaths};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use super::ui;
use super::utils::load_config;

pub async fn handle_build(
    dataset: PathBuf,
    out: Option<PathBuf>,
    index_name: Option<String>,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = out {
        config.index.dir = dir;
    }
    if let Some(name) = index_name {
        config.index.index_name = name;
    }
    config.validate()?;

    let needs = Requirements {
        embeddings: true,
        ..Requirements::default()
    };
    let credentials = Credentials::resolve(&config, needs)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(format!("Reading {}...", dataset.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let records = read_records(&dataset, &config.dataset)
        .with_context(|| format!("failed to read dataset {}", dataset.display()))?;
    let chunks = CorpusIngestor::new(&config.chunking, &config.dataset)?.ingest(&records)?;
    spinner.finish_with_message(format!(
        "Read {} records into {} chunks.",
        records.len(),
        chunks.len()
    ));

    let embedder = select_embedder(&config.embedding, &credentials)?;
    info!(model = %embedder.model_id(), "embedding corpus");

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message("Embedding chunks");

    let index = IndexBuilder::new(embedder, config.embedding.batch_size, config.index.metric)
        .build_with_progress(chunks, |done, _| pb.set_position(done as u64))
        .await;
    pb.finish_and_clear();
    let index = index?;

    let paths = IndexPaths::new(&config.index.dir, &config.index.index_name);
    let manifest = index
        .save(&paths)
        .with_context(|| format!("failed to save index to {}", config.index.dir.display()))?;

    ui::print_success(&format!(
        "Indexed {} chunks ({}-dim, {}) into {}",
        manifest.count,
        manifest.dimension,
        manifest.metric,
        paths.manifest().display()
    ));
    Ok(ExitCode::SUCCESS)
}
