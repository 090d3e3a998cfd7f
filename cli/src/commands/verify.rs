use anyhow::Result;
use defraud_agent::{QaTool, QueryResponse};
use defraud_config::Requirements;
use std::path::Path;
use std::process::ExitCode;

use super::utils::{print_response, service_context};

/// Retrieval plus synthesis, without the agent loop.
pub async fn handle_verify(
    claim: String,
    json: bool,
    trust_index: bool,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let ctx = service_context(config_path, |_| Requirements::qa(), trust_index)?;

    let response = match QaTool::from_context(&ctx) {
        Ok(qa) => match qa.answer(&claim).await {
            Ok((synthesis, sources)) => QueryResponse::verdict(synthesis.verdict, sources),
            Err(err) => QueryResponse::failure(&err),
        },
        Err(err) => QueryResponse::failure(&err),
    };

    print_response(&response, json)
}
