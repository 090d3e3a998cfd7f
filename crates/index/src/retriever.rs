use crate::vector::VectorIndex;
use defraud_core::{Embedder, Result, ScoredChunk};
use std::sync::Arc;
use tracing::debug;

/// Query-time wrapper: embed the text once, then rank by similarity.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self { index, embedder, k }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.retrieve_with_k(query, self.k).await
    }

    pub async fn retrieve_with_k(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = self.embedder.embed(query).await?;
        let results = self.index.query(&vector, k)?;
        debug!(query, k, hits = results.len(), "retrieved");
        Ok(results)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }
}
