use anyhow::Result;
use console::Style;
use defraud_config::{Config, Requirements};
use std::path::Path;
use std::process::ExitCode;

use super::utils::service_context;

pub async fn handle_retrieve(
    query: String,
    top: Option<usize>,
    trust_index: bool,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let needs = |_: &Config| Requirements {
        embeddings: true,
        ..Requirements::default()
    };
    let ctx = service_context(config_path, needs, trust_index)?;
    let retriever = ctx.retriever()?;
    let k = top.unwrap_or_else(|| retriever.k());

    let hits = retriever.retrieve_with_k(&query, k).await?;
    if hits.is_empty() {
        println!("No results.");
        return Ok(ExitCode::SUCCESS);
    }

    for hit in hits {
        let header = format!(
            "#{} {}  score {:.4}  label {}  {}",
            hit.rank + 1,
            hit.chunk.id,
            hit.score,
            hit.chunk.metadata.label_kind(),
            hit.chunk.metadata.source
        );
        println!("{}", Style::new().bold().blue().apply_to(header));
        println!("{}", Style::new().dim().apply_to(hit.chunk.text.trim()));
        println!();
    }
    Ok(ExitCode::SUCCESS)
}
