//! Configuration type definitions
//!
//! This module contains all configuration structures organized by concern.
//! Each type is self-contained with validation and sensible defaults.

pub mod agent;
pub mod chunking;
pub mod dataset;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod retrieval;
pub mod search;

pub use agent::AgentConfig;
pub use chunking::ChunkingConfig;
pub use dataset::DatasetConfig;
pub use embedding::{EmbeddingBackend, EmbeddingConfig};
pub use index::{DistanceMetric, IndexConfig};
pub use llm::{LlmConfig, LlmProvider};
pub use retrieval::RetrievalConfig;
pub use search::WebSearchConfig;

use serde::{Deserialize, Serialize};

/// Main configuration struct aggregating all settings
///
/// Organized by functional area: offline build settings first, serving
/// settings after.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tabular dataset columns and row handling
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Document chunking
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index location and metric
    #[serde(default)]
    pub index: IndexConfig,

    /// Query-time retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Generative model settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Live web search provider
    #[serde(default)]
    pub search: WebSearchConfig,
}

impl crate::validation::Validate for Config {
    fn validate(&self) -> crate::error::Result<()> {
        self.dataset.validate()?;
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.index.validate()?;
        self.retrieval.validate()?;
        self.llm.validate()?;
        self.agent.validate()?;
        self.search.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validate;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_pipeline_settings() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.k, 4);
        assert_eq!(config.index.index_name, "index");
    }
}
