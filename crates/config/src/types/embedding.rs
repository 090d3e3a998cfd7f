//! Embedding provider configuration

use serde::{Deserialize, Serialize};

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Embedding backend to use
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Model name for the selected backend
    ///
    /// Examples:
    /// - OpenAI: "text-embedding-3-small"
    /// - Ollama: "all-minilm", "nomic-embed-text"
    /// - Hashing: ignored, recorded in the index manifest as "hashing-<dim>"
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Vector dimension produced by the hashing backend
    ///
    /// Remote backends report their own dimension; the index checks it.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Number of chunks sent per embedding request during a build
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Optional API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Environment variable holding the API key for the `openai` backend
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Embedding backend options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible API (requires an API key)
    #[serde(rename = "openai")]
    External,

    /// Local Ollama server
    #[default]
    Ollama,

    /// Deterministic offline feature hashing (no service needed)
    Hashing,
}

impl EmbeddingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingBackend::External => "openai",
            EmbeddingBackend::Ollama => "ollama",
            EmbeddingBackend::Hashing => "hashing",
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model_name: default_model_name(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            api_base: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
        }
    }
}

impl crate::validation::Validate for EmbeddingConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::validation::{validate_non_empty, validate_positive, validate_url};

        validate_non_empty("embedding.model_name", &self.model_name)?;
        validate_positive("embedding.dimension", self.dimension, 0)?;
        validate_positive("embedding.batch_size", self.batch_size, 0)?;
        validate_positive("embedding.timeout_secs", self.timeout_secs as usize, 0)?;
        validate_url("embedding.api_base", self.api_base.as_deref())?;

        if self.backend == EmbeddingBackend::External {
            validate_non_empty("embedding.api_key_env", &self.api_key_env)?;
        }

        Ok(())
    }
}

fn default_model_name() -> String {
    "all-minilm".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_batch_size() -> usize {
    64
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}
