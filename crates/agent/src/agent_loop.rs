use crate::parser::{parse_step, Action, ParsedStep};
use crate::prompts::{
    corrective_prompt, observation_prompt, question_prompt, system_prompt, LAST_STEP_NOTICE,
};
use crate::tool::{Tool, ToolOutput, ToolRegistry};
use crate::tools::{QaTool, WebSearchTool};
use defraud_config::AgentConfig;
use defraud_context::ServiceContext;
use defraud_core::{ChatModel, DefraudError, Message, ProviderFailure, Result, SourceRef};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Progress notifications for callers that render the run as it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    StepStart(usize),
    Thought(String),
    ToolCall { tool: String, input: String },
    Observation { tool: String, content: String, failed: bool },
    ParseRetry { attempt: usize, reason: String },
}

/// One Thought / Action / Observation triple. The final step has no observation.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub iteration: usize,
    pub thought: String,
    pub action: Action,
    pub observation: Option<String>,
    pub failed: bool,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AgentMetrics {
    pub total_duration_ms: u128,
    pub llm_calls: usize,
    pub tool_calls: usize,
    pub failed_tool_calls: usize,
    pub parse_retries: usize,
    pub total_steps: usize,
    pub tools_used: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub trace: Vec<AgentStep>,
    pub metrics: AgentMetrics,
}

/// Reasoning loop that routes a claim between the registered tools.
///
/// Each iteration asks the chat model for one action, runs the named tool and
/// feeds its observation back. `max_iterations` bounds tool invocations; once
/// it is spent the model gets one more turn to give a final answer, and
/// another tool request ends the run with `AgentExhausted`. Parse retries do
/// not count as iterations.
pub struct AgentLoop {
    llm: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl AgentLoop {
    pub fn new(llm: Arc<dyn ChatModel>, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self { llm, tools, config }
    }

    /// QA tool always, web search when enabled in config.
    pub fn from_context(ctx: &ServiceContext) -> Result<Self> {
        let mut tools = ToolRegistry::new().with(Arc::new(QaTool::from_context(ctx)?));
        if ctx.web_search_enabled() {
            tools.register(Arc::new(WebSearchTool::new(
                ctx.search_provider()?,
                ctx.config.search.max_results,
            )));
        }
        Ok(Self::new(ctx.chat_model()?, tools, ctx.config.agent.clone()))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn run(&self, question: &str) -> Result<AgentOutcome> {
        self.run_with_cancel(question, &CancellationToken::new(), |_| {})
            .await
    }

    pub async fn run_with_events<F>(&self, question: &str, on_event: F) -> Result<AgentOutcome>
    where
        F: FnMut(AgentEvent) + Send,
    {
        self.run_with_cancel(question, &CancellationToken::new(), on_event)
            .await
    }

    pub async fn run_with_cancel<F>(
        &self,
        question: &str,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<AgentOutcome>
    where
        F: FnMut(AgentEvent) + Send,
    {
        let start = Instant::now();
        let mut metrics = AgentMetrics::default();
        let mut trace: Vec<AgentStep> = Vec::new();
        let mut sources: Vec<SourceRef> = Vec::new();
        let mut messages = vec![
            Message::system(system_prompt(&self.tools)),
            Message::user(question_prompt(question)),
        ];
        let mut iteration = 0;

        info!(tools = ?self.tools.names(), "agent run: {question}");

        loop {
            if cancel.is_cancelled() {
                return Err(DefraudError::Cancelled);
            }
            on_event(AgentEvent::StepStart(iteration + 1));

            let (reply, step) = self
                .next_step(&mut messages, cancel, &mut metrics, &mut on_event)
                .await?;
            let ParsedStep { thought, action } = step;
            if !thought.is_empty() {
                on_event(AgentEvent::Thought(thought.clone()));
            }

            let (tool, input) = match action {
                Action::Final { text } => {
                    let answer = text.clone();
                    trace.push(AgentStep {
                        iteration: iteration + 1,
                        thought,
                        action: Action::Final { text },
                        observation: None,
                        failed: false,
                    });
                    metrics.total_steps = iteration;
                    metrics.total_duration_ms = start.elapsed().as_millis();
                    info!(
                        steps = iteration,
                        llm_calls = metrics.llm_calls,
                        "agent finished"
                    );
                    return Ok(AgentOutcome {
                        answer,
                        sources,
                        trace,
                        metrics,
                    });
                }
                Action::Invoke { ref tool, ref input } => (tool.clone(), input.clone()),
            };
            let tool_name = tool.name().to_string();

            if iteration >= self.config.max_iterations {
                warn!(
                    max_iterations = self.config.max_iterations,
                    "agent kept requesting tools after its budget was spent"
                );
                return Err(DefraudError::AgentExhausted(self.config.max_iterations));
            }
            iteration += 1;

            on_event(AgentEvent::ToolCall {
                tool: tool_name.clone(),
                input: input.clone(),
            });
            metrics.tool_calls += 1;
            *metrics.tools_used.entry(tool_name.clone()).or_insert(0) += 1;

            let (observation, failed) = match self.act(tool.tool(), &input, cancel).await? {
                Ok(output) => {
                    for source in output.sources {
                        if !sources.contains(&source) {
                            sources.push(source);
                        }
                    }
                    (self.clip(output.content), false)
                }
                Err(err @ DefraudError::ToolInvocation { .. }) => {
                    warn!(tool = %tool_name, "tool failed: {err}");
                    metrics.failed_tool_calls += 1;
                    (self.clip(format!("Error: {err}")), true)
                }
                Err(err) => return Err(err),
            };

            on_event(AgentEvent::Observation {
                tool: tool_name.clone(),
                content: observation.clone(),
                failed,
            });

            let mut feedback = observation_prompt(&observation);
            if iteration == self.config.max_iterations {
                feedback.push_str("\n\n");
                feedback.push_str(LAST_STEP_NOTICE);
            }
            messages.push(Message::assistant(reply));
            messages.push(Message::user(feedback));

            trace.push(AgentStep {
                iteration,
                thought,
                action,
                observation: Some(observation),
                failed,
            });
        }
    }

    /// Ask for the next action, retrying with a corrective prompt on parse failure.
    async fn next_step<F>(
        &self,
        messages: &mut Vec<Message>,
        cancel: &CancellationToken,
        metrics: &mut AgentMetrics,
        on_event: &mut F,
    ) -> Result<(String, ParsedStep)>
    where
        F: FnMut(AgentEvent) + Send,
    {
        let mut attempt = 0;
        loop {
            let reply = self.reason(messages, cancel).await?;
            metrics.llm_calls += 1;
            debug!("reasoner reply: {reply}");

            match parse_step(&reply, &self.tools) {
                Ok(step) => return Ok((reply, step)),
                Err(failure) if attempt < self.config.max_parse_retries => {
                    attempt += 1;
                    metrics.parse_retries += 1;
                    warn!(attempt, "unusable reasoner reply: {failure}");
                    on_event(AgentEvent::ParseRetry {
                        attempt,
                        reason: failure.to_string(),
                    });
                    messages.push(Message::assistant(reply));
                    messages.push(Message::user(corrective_prompt(
                        &failure.to_string(),
                        &self.tools,
                    )));
                }
                Err(failure) => return Err(DefraudError::AgentParse(failure.to_string())),
            }
        }
    }

    async fn reason(&self, messages: &[Message], cancel: &CancellationToken) -> Result<String> {
        let reply = cancellable(cancel, timeout(self.step_timeout(), self.llm.chat(messages)))
            .await?;
        match reply {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(DefraudError::ToolInvocation {
                failure, message, ..
            })) => Err(DefraudError::tool("reasoner", failure, message)),
            Ok(Err(other)) => Err(other),
            Err(_) => Err(DefraudError::tool(
                "reasoner",
                ProviderFailure::Timeout,
                format!("no response within {}s", self.config.step_timeout_secs),
            )),
        }
    }

    /// Run one tool. The outer `Result` only carries cancellation.
    async fn act(
        &self,
        tool: &Arc<dyn Tool>,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<Result<ToolOutput>> {
        let outcome = cancellable(cancel, timeout(self.step_timeout(), tool.invoke(input))).await?;
        Ok(outcome.unwrap_or_else(|_| {
            Err(DefraudError::tool(
                tool.name(),
                ProviderFailure::Timeout,
                format!("no response within {}s", self.config.step_timeout_secs),
            ))
        }))
    }

    fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.config.step_timeout_secs)
    }

    fn clip(&self, text: String) -> String {
        let max = self.config.max_observation_chars;
        match text.char_indices().nth(max) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None if text.trim().is_empty() => "(empty result)".to_string(),
            None => text,
        }
    }
}

async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = T>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DefraudError::Cancelled),
        out = fut => Ok(out),
    }
}
