use crate::prompts::{SYNTHESIS_PROMPT, NO_EVIDENCE_VERDICT};
use defraud_core::{ChatModel, DefraudError, Message, ProviderFailure, Result, ScoredChunk};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Synthesis {
    pub verdict: String,
    pub used_chunk_ids: Vec<String>,
}

/// Turns a claim plus retrieved chunks into a verdict through the chat model.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn ChatModel>, timeout_secs: u64) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn synthesize(&self, question: &str, chunks: &[ScoredChunk]) -> Result<Synthesis> {
        if chunks.is_empty() {
            return Ok(Synthesis {
                verdict: NO_EVIDENCE_VERDICT.to_string(),
                used_chunk_ids: Vec::new(),
            });
        }

        let mut context = String::new();
        for hit in chunks {
            context.push_str(&format!(
                "[{}] (label: {}) {}\n",
                hit.chunk.id,
                hit.chunk.metadata.label_kind(),
                hit.chunk.text.trim()
            ));
        }

        let messages = vec![
            Message::system(SYNTHESIS_PROMPT),
            Message::user(format!("Context:\n{context}\nClaim: {question}")),
        ];

        let response = timeout(self.timeout, self.llm.chat(&messages))
            .await
            .map_err(|_| {
                DefraudError::tool(
                    "synthesizer",
                    ProviderFailure::Timeout,
                    format!("no response within {}s", self.timeout.as_secs()),
                )
            })??;

        let verdict = response.trim();
        if verdict.is_empty() {
            return Err(DefraudError::tool(
                "synthesizer",
                ProviderFailure::MalformedResponse,
                "empty verdict",
            ));
        }

        let used_chunk_ids = cited_ids(verdict, chunks);
        debug!(cited = used_chunk_ids.len(), "synthesized verdict");
        Ok(Synthesis {
            verdict: verdict.to_string(),
            used_chunk_ids,
        })
    }
}

/// Chunk ids cited as `[id]` in `text`, in context order; every id if none is cited.
fn cited_ids(text: &str, chunks: &[ScoredChunk]) -> Vec<String> {
    let cited: Vec<String> = chunks
        .iter()
        .filter(|hit| text.contains(&format!("[{}]", hit.chunk.id)))
        .map(|hit| hit.chunk.id.clone())
        .collect();
    if cited.is_empty() {
        chunks.iter().map(|hit| hit.chunk.id.clone()).collect()
    } else {
        cited
    }
}
