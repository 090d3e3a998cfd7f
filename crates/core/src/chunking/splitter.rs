use crate::{DefraudError, Result};
use defraud_config::ChunkingConfig;
use text_splitter::{Characters, ChunkConfig, TextSplitter};

/// Boundary-aware recursive splitter.
///
/// Tries paragraph breaks first, then sentences, then words, and only falls
/// back to graphemes for a single word longer than the chunk size. Sizes are
/// counted in characters. Trimming is off so that every byte of the input
/// belongs to at least one chunk.
pub struct RecursiveSplitter {
    splitter: TextSplitter<Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| DefraudError::config("chunking.chunk_overlap", e.to_string()))?
            .with_trim(false);

        Ok(Self {
            splitter: TextSplitter::new(chunk_config),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        })
    }

    /// Split `text` into `(byte_offset, slice)` pairs in document order.
    pub fn split<'t>(&self, text: &'t str) -> Vec<(usize, &'t str)> {
        self.splitter.chunk_indices(text).collect()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}
