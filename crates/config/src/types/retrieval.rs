//! Retrieval configuration

use serde::{Deserialize, Serialize};

/// Query-time retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Number of chunks returned per query
    #[serde(default = "default_k")]
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

impl crate::validation::Validate for RetrievalConfig {
    fn validate(&self) -> crate::error::Result<()> {
        crate::validation::validate_positive("retrieval.k", self.k, 0)
    }
}

fn default_k() -> usize {
    4
}
