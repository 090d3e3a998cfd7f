use anyhow::Result;
use console::Style;
use defraud_agent::{AgentEvent, AgentLoop, QueryResponse};
use defraud_config::Requirements;
use std::path::Path;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use super::ui;
use super::utils::{print_response, service_context};

pub async fn handle_ask(
    claim: String,
    verbose: bool,
    json: bool,
    trust_index: bool,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let ctx = service_context(config_path, Requirements::agent, trust_index)?;

    let agent = match AgentLoop::from_context(&ctx) {
        Ok(agent) => agent,
        Err(err) if json => return print_response(&QueryResponse::failure(&err), true),
        Err(err) => return Err(err.into()),
    };

    if verbose {
        ui::print_header(&format!("Claim: {}", claim));
        ui::print_key_value("Tools", &agent.tools().names().join(", "));
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let result = agent
        .run_with_cancel(&claim, &cancel, |event| {
            if verbose && !json {
                render_event(event);
            }
        })
        .await;

    if verbose && !json {
        if let Ok(outcome) = &result {
            let m = &outcome.metrics;
            ui::print_header("Metrics");
            ui::print_key_value("steps", &m.total_steps.to_string());
            ui::print_key_value("llm calls", &m.llm_calls.to_string());
            ui::print_key_value(
                "tool calls",
                &format!("{} ({} failed)", m.tool_calls, m.failed_tool_calls),
            );
            ui::print_key_value("parse retries", &m.parse_retries.to_string());
            ui::print_key_value("elapsed", &format!("{} ms", m.total_duration_ms));
        }
    }

    print_response(&QueryResponse::from_outcome(result), json)
}

fn render_event(event: AgentEvent) {
    match event {
        AgentEvent::StepStart(step) => {
            println!("\n{}", Style::new().dim().apply_to(format!("── Step {} ──", step)));
        }
        AgentEvent::Thought(thought) => {
            ui::print_panel("Thought", &thought, Style::new().green());
        }
        AgentEvent::ToolCall { tool, input } => {
            ui::print_panel("Tool Call", &format!("{}({})", tool, input), Style::new().yellow());
        }
        AgentEvent::Observation {
            tool: _,
            content,
            failed,
        } => {
            let truncated = match content.char_indices().nth(300) {
                Some((cut, _)) => format!("{}...", &content[..cut]),
                None => content,
            };
            let color = if failed {
                Style::new().red()
            } else {
                Style::new().blue()
            };
            ui::print_panel("Observation", &truncated, color);
        }
        AgentEvent::ParseRetry { attempt, reason } => {
            println!(
                "{} {}",
                Style::new().yellow().bold().apply_to(format!("retry {}:", attempt)),
                reason
            );
        }
    }
}
