use async_trait::async_trait;
use defraud_agent::{
    AgentEvent, AgentLoop, AnswerSynthesizer, QaTool, QueryResponse, Tool, ToolOutput,
    ToolRegistry, WebSearchTool,
};
use defraud_config::{AgentConfig, ChunkingConfig, DatasetConfig, DistanceMetric};
use defraud_context::HashingEmbedder;
use defraud_core::{
    ChatModel, CorpusIngestor, DefraudError, Message, ProviderFailure, RawRecord, Result,
    SearchProvider, SourceOrigin, WebResult,
};
use defraud_index::{IndexBuilder, Retriever};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Replays canned replies in order, repeating the last one forever.
struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            last: Mutex::new(String::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn chat(&self, _messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.replies.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }

    fn model_id(&self) -> String {
        "scripted".to_string()
    }
}

struct DownChat;

#[async_trait]
impl ChatModel for DownChat {
    async fn chat(&self, _messages: &[Message]) -> Result<String> {
        Err(DefraudError::tool("llm", ProviderFailure::Unavailable, "connection refused"))
    }

    fn model_id(&self) -> String {
        "down".to_string()
    }
}

struct NetworkDownSearch {
    calls: AtomicUsize,
}

#[async_trait]
impl SearchProvider for NetworkDownSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<WebResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DefraudError::tool(
            "search",
            ProviderFailure::Unavailable,
            "network unreachable",
        ))
    }
}

struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "Slow"
    }

    fn description(&self) -> &str {
        "never answers in time"
    }

    async fn invoke(&self, _input: &str) -> Result<ToolOutput> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ToolOutput::default())
    }
}

const QA_STEP: &str = "Thought: check the news dataset\nAction: News RAG QA\nAction Input: Did the election get certified?";
const SEARCH_STEP: &str = "Thought: look online\nAction: Web Search\nAction Input: election certified";
const FINAL_STEP: &str = "Thought: I now know the final answer\nFinal Answer: The claim is supported by the corpus.";

const ELECTION_URL: &str = "https://news.example/election";

async fn qa_tool() -> Arc<QaTool> {
    let mut records: Vec<RawRecord> = [
        "Election results certified",
        "Moon landing was staged",
        "Vaccine contains microchip",
    ]
    .iter()
    .enumerate()
    .map(|(i, title)| RawRecord::new(i + 1, title, "", if i == 0 { "1" } else { "0" }))
    .collect();
    records[0].source = Some(ELECTION_URL.to_string());
    let chunks = CorpusIngestor::new(&ChunkingConfig::default(), &DatasetConfig::default())
        .unwrap()
        .ingest(&records)
        .unwrap();
    let embedder = Arc::new(HashingEmbedder::new(384));
    let index = IndexBuilder::new(embedder.clone(), 16, DistanceMetric::Cosine)
        .build(chunks)
        .await
        .unwrap();
    let retriever = Retriever::new(Arc::new(index), embedder, 1);
    let synthesizer = AnswerSynthesizer::new(
        ScriptedChat::new(&["Certified by officials [doc-1:0]."]),
        5,
    );
    Arc::new(QaTool::new(retriever, synthesizer))
}

fn config(max_iterations: usize) -> AgentConfig {
    AgentConfig {
        max_iterations,
        max_parse_retries: 1,
        step_timeout_secs: 1,
        ..AgentConfig::default()
    }
}

async fn tools_with_failing_search() -> (ToolRegistry, Arc<NetworkDownSearch>) {
    let search = Arc::new(NetworkDownSearch {
        calls: AtomicUsize::new(0),
    });
    let tools = ToolRegistry::new()
        .with(qa_tool().await)
        .with(Arc::new(WebSearchTool::new(search.clone(), 5)));
    (tools, search)
}

#[tokio::test]
async fn failing_search_still_reaches_answer_from_corpus() {
    let (tools, search) = tools_with_failing_search().await;
    let policy = ScriptedChat::new(&[SEARCH_STEP, QA_STEP, FINAL_STEP]);
    let agent = AgentLoop::new(policy, tools, config(2));

    let outcome = agent.run("Did the election get certified?").await.unwrap();

    assert_eq!(outcome.answer, "The claim is supported by the corpus.");
    assert!(outcome.metrics.total_steps <= 2);
    assert_eq!(outcome.metrics.failed_tool_calls, 1);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    assert!(!outcome.sources.is_empty());
    assert!(outcome
        .sources
        .iter()
        .all(|s| s.origin == SourceOrigin::Corpus));
    assert_eq!(outcome.sources[0].id, "doc-1:0");

    let first = &outcome.trace[0];
    assert!(first.failed);
    assert!(first
        .observation
        .as_deref()
        .unwrap()
        .contains("network unreachable"));
}

#[tokio::test]
async fn unknown_tool_recovers_after_one_corrective_retry() {
    let (tools, _) = tools_with_failing_search().await;
    let policy = ScriptedChat::new(&[
        "Thought: hmm\nAction: Lookup\nAction Input: election",
        QA_STEP,
        FINAL_STEP,
    ]);
    let agent = AgentLoop::new(policy.clone(), tools, config(4));

    let mut retries = Vec::new();
    let outcome = agent
        .run_with_events("Did the election get certified?", |event| {
            if let AgentEvent::ParseRetry { reason, .. } = event {
                retries.push(reason);
            }
        })
        .await
        .unwrap();

    assert_eq!(retries.len(), 1);
    assert!(retries[0].contains("Lookup"));
    assert_eq!(outcome.metrics.parse_retries, 1);
    assert_eq!(outcome.metrics.total_steps, 1);
    assert_eq!(policy.calls(), 3);
}

#[tokio::test]
async fn unknown_tool_twice_fails_with_parse_error() {
    let (tools, _) = tools_with_failing_search().await;
    let policy = ScriptedChat::new(&["Action: Lookup\nAction Input: election"]);
    let agent = AgentLoop::new(policy.clone(), tools, config(4));

    let err = agent.run("claim").await.unwrap_err();

    assert_eq!(err.kind(), "AgentParseError");
    assert_eq!(policy.calls(), 2);
}

#[tokio::test]
async fn policy_that_never_answers_is_exhausted() {
    let (tools, search) = tools_with_failing_search().await;
    let policy = ScriptedChat::new(&[SEARCH_STEP]);
    let agent = AgentLoop::new(policy.clone(), tools, config(3));

    let err = agent.run("claim").await.unwrap_err();

    assert!(matches!(err, DefraudError::AgentExhausted(3)));
    assert_eq!(search.calls.load(Ordering::SeqCst), 3);
    assert_eq!(policy.calls(), 4);
}

#[tokio::test]
async fn garbage_policy_terminates() {
    let (tools, _) = tools_with_failing_search().await;
    let policy = ScriptedChat::new(&["I refuse to follow the format."]);
    let agent = AgentLoop::new(policy, tools, config(3));

    let response = QueryResponse::from_outcome(agent.run("claim").await);
    match response {
        QueryResponse::Failure { kind, .. } => assert_eq!(kind, "AgentParseError"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_reasoner_fails_the_query() {
    let (tools, _) = tools_with_failing_search().await;
    let agent = AgentLoop::new(Arc::new(DownChat), tools, config(3));

    match agent.run("claim").await.unwrap_err() {
        DefraudError::ToolInvocation { tool, failure, .. } => {
            assert_eq!(tool, "reasoner");
            assert_eq!(failure, ProviderFailure::Unavailable);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_tool_times_out_into_an_observation() {
    let tools = ToolRegistry::new().with(Arc::new(SlowTool));
    let policy = ScriptedChat::new(&[
        "Action: Slow\nAction Input: anything",
        "Final Answer: gave up waiting",
    ]);
    let agent = AgentLoop::new(policy, tools, config(2));

    let outcome = agent.run("claim").await.unwrap();

    assert_eq!(outcome.answer, "gave up waiting");
    assert!(outcome.trace[0].failed);
    assert!(outcome.trace[0]
        .observation
        .as_deref()
        .unwrap()
        .contains("timeout"));
    assert!(outcome.sources.is_empty());
}

#[tokio::test]
async fn cancellation_aborts_in_flight_tool() {
    let tools = ToolRegistry::new().with(Arc::new(SlowTool));
    let policy = ScriptedChat::new(&["Action: Slow\nAction Input: anything"]);
    let mut cfg = config(2);
    cfg.step_timeout_secs = 60;
    let agent = AgentLoop::new(policy, tools, cfg);

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = agent
        .run_with_cancel("claim", &token, |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, DefraudError::Cancelled));
}

#[tokio::test]
async fn events_follow_step_order() {
    let (tools, _) = tools_with_failing_search().await;
    let policy = ScriptedChat::new(&[QA_STEP, FINAL_STEP]);
    let agent = AgentLoop::new(policy, tools, config(2));

    let mut events = Vec::new();
    agent
        .run_with_events("claim", |e| events.push(e))
        .await
        .unwrap();

    assert!(matches!(events[0], AgentEvent::StepStart(1)));
    assert!(matches!(events[1], AgentEvent::Thought(_)));
    assert!(matches!(events[2], AgentEvent::ToolCall { ref tool, .. } if tool == "News RAG QA"));
    assert!(matches!(events[3], AgentEvent::Observation { failed: false, .. }));
    assert!(matches!(events[4], AgentEvent::StepStart(2)));
}

#[tokio::test]
async fn verdict_sources_name_the_article() {
    let qa = qa_tool().await;
    let (synthesis, sources) = qa.answer("Did the election get certified?").await.unwrap();
    let response = QueryResponse::verdict(synthesis.verdict, sources);

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["status"], "verdict");
    assert_eq!(value["sources"][0]["id"], "doc-1:0");
    assert_eq!(value["sources"][0]["source"], ELECTION_URL);
    assert_eq!(value["sources"][0]["label"], "1");

    let observation = qa.invoke("Did the election get certified?").await.unwrap();
    assert!(observation.content.contains(ELECTION_URL));
}
