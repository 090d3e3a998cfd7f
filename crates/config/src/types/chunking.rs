//! Document chunking configuration

use serde::{Deserialize, Serialize};

/// Configuration for splitting documents into chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum characters shared between consecutive chunks
    ///
    /// Provides context continuity across a boundary. Must be < chunk_size.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Separator placed between a record's title and body
    #[serde(default = "default_separator")]
    pub title_separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            title_separator: default_separator(),
        }
    }
}

impl crate::validation::Validate for ChunkingConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ConfigError;
        use crate::validation::validate_positive;

        validate_positive("chunking.chunk_size", self.chunk_size, 0)?;

        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::ValidationError {
                field: "chunking.chunk_overlap".to_string(),
                message: format!(
                    "chunk_overlap ({}) must be < chunk_size ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }

        if self.title_separator.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "chunking.title_separator".to_string(),
                message: "separator must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_separator() -> String {
    ". ".to_string()
}
