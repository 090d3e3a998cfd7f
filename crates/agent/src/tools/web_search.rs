use crate::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use defraud_core::{Result, SearchProvider, SourceRef};
use std::sync::Arc;

pub const WEB_SEARCH_TOOL_NAME: &str = "Web Search";

pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        Self {
            provider,
            max_results,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Real-time web search. Use it for recent events the news dataset may not cover."
    }

    async fn invoke(&self, input: &str) -> Result<ToolOutput> {
        let results = self.provider.search(input, self.max_results).await?;
        if results.is_empty() {
            return Ok(ToolOutput {
                content: "No results found.".to_string(),
                sources: Vec::new(),
            });
        }

        let mut content = String::new();
        for (i, r) in results.iter().enumerate() {
            content.push_str(&format!("{}. {} ({})\n", i + 1, r.title, r.link));
            if !r.snippet.is_empty() {
                content.push_str(&format!("   {}\n", r.snippet));
            }
        }
        let sources = results.iter().map(|r| SourceRef::web(&r.link)).collect();
        Ok(ToolOutput {
            content: content.trim_end().to_string(),
            sources,
        })
    }
}
