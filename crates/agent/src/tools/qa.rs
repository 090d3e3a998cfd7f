use crate::synthesizer::{AnswerSynthesizer, Synthesis};
use crate::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use defraud_context::ServiceContext;
use defraud_core::{Result, SourceRef};
use defraud_index::Retriever;
use tracing::debug;

pub const QA_TOOL_NAME: &str = "News RAG QA";

/// Retrieval over the indexed corpus followed by answer synthesis.
pub struct QaTool {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl QaTool {
    pub fn new(retriever: Retriever, synthesizer: AnswerSynthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    /// Retriever over the loaded index plus the configured chat model.
    pub fn from_context(ctx: &ServiceContext) -> Result<Self> {
        let synthesizer = AnswerSynthesizer::new(ctx.chat_model()?, ctx.config.llm.timeout_secs);
        Ok(Self::new(ctx.retriever()?, synthesizer))
    }

    /// Retrieve and synthesize, returning the structured verdict.
    pub async fn answer(&self, question: &str) -> Result<(Synthesis, Vec<SourceRef>)> {
        let hits = self.retriever.retrieve(question).await?;
        debug!(hits = hits.len(), "qa retrieval");
        let synthesis = self.synthesizer.synthesize(question, &hits).await?;

        let sources = synthesis
            .used_chunk_ids
            .iter()
            .filter_map(|id| hits.iter().find(|h| &h.chunk.id == id))
            .map(|h| SourceRef::corpus(&h.chunk))
            .collect();
        Ok((synthesis, sources))
    }
}

#[async_trait]
impl Tool for QaTool {
    fn name(&self) -> &str {
        QA_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Answers from the labeled news dataset. Input is the claim or question to check."
    }

    async fn invoke(&self, input: &str) -> Result<ToolOutput> {
        let (synthesis, sources) = self.answer(input).await?;
        let mut content = synthesis.verdict;
        if !sources.is_empty() {
            let labelled: Vec<String> = sources
                .iter()
                .map(|s| match &s.label {
                    Some(label) => format!("{} (label {label}, {})", s.id, s.source),
                    None => format!("{} ({})", s.id, s.source),
                })
                .collect();
            content.push_str(&format!("\nSources: {}", labelled.join(", ")));
        }
        Ok(ToolOutput { content, sources })
    }
}
