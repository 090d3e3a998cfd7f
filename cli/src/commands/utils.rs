use anyhow::{Context, Result};
use defraud_agent::QueryResponse;
use defraud_config::{Config, Credentials, Requirements, Validate};
use defraud_context::ServiceContext;
use defraud_core::{SourceOrigin, SourceRef};
use defraud_index::TrustPolicy;
use std::path::Path;
use std::process::ExitCode;

use super::ui;

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Config plus credentials checked up front, wrapped in a service context.
pub fn service_context(
    config_path: Option<&Path>,
    needs: impl FnOnce(&Config) -> Requirements,
    trust_index: bool,
) -> Result<ServiceContext> {
    let config = load_config(config_path)?;
    config.validate()?;
    let credentials = Credentials::resolve(&config, needs(&config))?;
    let trust = if trust_index {
        TrustPolicy::TrustUnverified
    } else {
        TrustPolicy::Verify
    };
    Ok(ServiceContext::new(config, credentials, trust))
}

pub fn print_response(response: &QueryResponse, json: bool) -> Result<ExitCode> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(response).context("failed to encode response")?
        );
    } else {
        match response {
            QueryResponse::Verdict { verdict, sources } => {
                ui::print_header("Verdict");
                println!("{verdict}");
                if !sources.is_empty() {
                    ui::print_header("Sources");
                    for source in sources {
                        println!("  {}", describe_source(source));
                    }
                }
            }
            QueryResponse::Failure { kind, message } => {
                ui::print_error(&format!("{kind}: {message}"));
            }
        }
    }

    Ok(if response.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn describe_source(source: &SourceRef) -> String {
    match source.origin {
        SourceOrigin::Corpus => match &source.label {
            Some(label) => format!("{} [{}, label {}]", source.source, source.id, label),
            None => format!("{} [{}]", source.source, source.id),
        },
        SourceOrigin::Web => format!("{} [web]", source.source),
    }
}
