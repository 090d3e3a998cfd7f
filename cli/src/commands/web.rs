use anyhow::Result;
use console::Style;
use defraud_config::{Config, Requirements};
use std::path::Path;
use std::process::ExitCode;

use super::utils::service_context;

pub async fn handle_web(
    query: String,
    top: Option<usize>,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let needs = |_: &Config| Requirements {
        web_search: true,
        ..Requirements::default()
    };
    let ctx = service_context(config_path, needs, false)?;
    let provider = ctx.search_provider()?;
    let limit = top.unwrap_or(ctx.config.search.max_results);

    let results = provider.search(&query, limit).await?;
    if results.is_empty() {
        println!("No results found.");
        return Ok(ExitCode::SUCCESS);
    }

    for (i, r) in results.iter().enumerate() {
        println!(
            "{}",
            Style::new().bold().apply_to(format!("{}. {}", i + 1, r.title))
        );
        println!("   {}", Style::new().cyan().underlined().apply_to(&r.link));
        if !r.snippet.is_empty() {
            println!("   {}", Style::new().dim().apply_to(&r.snippet));
        }
        println!();
    }
    Ok(ExitCode::SUCCESS)
}
