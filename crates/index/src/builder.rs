use crate::vector::VectorIndex;
use defraud_config::DistanceMetric;
use defraud_core::{Chunk, DefraudError, Embedder, ProviderFailure, Result};
use std::sync::Arc;
use tracing::debug;

/// Embeds chunks in batches and builds the index.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    metric: DistanceMetric,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize, metric: DistanceMetric) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            metric,
        }
    }

    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<VectorIndex> {
        self.build_with_progress(chunks, |_, _| {}).await
    }

    /// Build, calling `progress(done, total)` after every batch.
    ///
    /// Any embedding failure aborts the build.
    pub async fn build_with_progress<F>(&self, chunks: Vec<Chunk>, progress: F) -> Result<VectorIndex>
    where
        F: Fn(usize, usize),
    {
        if chunks.is_empty() {
            return Err(DefraudError::EmptyCorpus(
                "no chunks to embed".to_string(),
            ));
        }

        let total = chunks.len();
        let mut embeddings = Vec::with_capacity(total);

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(DefraudError::tool(
                    "embedder",
                    ProviderFailure::MalformedResponse,
                    format!("asked for {} embeddings, got {}", texts.len(), vectors.len()),
                ));
            }
            embeddings.extend(vectors);
            debug!("embedded {}/{}", embeddings.len(), total);
            progress(embeddings.len(), total);
        }

        VectorIndex::build(chunks, embeddings, self.metric, self.embedder.model_id())
    }
}
