use crate::metric::{norm, similarity};
use defraud_config::DistanceMetric;
use defraud_core::{Chunk, DefraudError, Result, ScoredChunk};
use tracing::{debug, info};

/// Exact nearest-neighbour index over chunk embeddings.
///
/// Built once from a batch and read-only afterwards. Vectors are stored in one
/// flat buffer in insertion order, which is also the tie-break order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    pub(crate) metric: DistanceMetric,
    pub(crate) dimension: usize,
    pub(crate) model_id: String,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) vectors: Vec<f32>,
    norms: Vec<f32>,
}

impl VectorIndex {
    /// Build from parallel `chunks` / `embeddings` in one pass.
    pub fn build(
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        metric: DistanceMetric,
        model_id: impl Into<String>,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(DefraudError::EmptyCorpus(
                "cannot build an index from zero chunks".to_string(),
            ));
        }
        if chunks.len() != embeddings.len() {
            return Err(DefraudError::ingestion(
                "batch",
                format!(
                    "{} chunks but {} embeddings",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }

        let dimension = embeddings[0].len();
        if dimension == 0 {
            return Err(DefraudError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let mut vectors = Vec::with_capacity(dimension * embeddings.len());
        for embedding in &embeddings {
            if embedding.len() != dimension {
                return Err(DefraudError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            vectors.extend_from_slice(embedding);
        }

        let index = Self::from_parts(metric, dimension, model_id.into(), chunks, vectors);
        info!(
            "built {} index: {} vectors of dimension {}",
            index.metric,
            index.len(),
            index.dimension
        );
        Ok(index)
    }

    /// Assemble an index whose parts were already validated.
    pub(crate) fn from_parts(
        metric: DistanceMetric,
        dimension: usize,
        model_id: String,
        chunks: Vec<Chunk>,
        vectors: Vec<f32>,
    ) -> Self {
        let norms = vectors.chunks_exact(dimension).map(norm).collect();
        Self {
            metric,
            dimension,
            model_id,
            chunks,
            vectors,
            norms,
        }
    }

    /// The `k` most similar chunks, best first.
    ///
    /// Scores are non-increasing by rank; equal scores keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if vector.len() != self.dimension {
            return Err(DefraudError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, v)| {
                let score = similarity(self.metric, vector, query_norm, v, self.norms[i]);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        // stable: ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!(
            k,
            top = scored.first().map(|(_, s)| *s),
            "vector query over {} chunks",
            self.len()
        );

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (i, score))| ScoredChunk {
                score,
                rank,
                chunk: self.chunks[i].clone(),
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn vector(&self, i: usize) -> Option<&[f32]> {
        self.vectors
            .get(i * self.dimension..(i + 1) * self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defraud_core::DocumentMetadata;

    fn chunk(id: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            parent_document_id: id.to_string(),
            ordinal: 0,
            text: id.to_string(),
            start_offset: 0,
            end_offset: id.len(),
            metadata: DocumentMetadata {
                label: "1".to_string(),
                source: id.to_string(),
            },
        }
    }

    fn index(metric: DistanceMetric) -> VectorIndex {
        VectorIndex::build(
            vec![chunk("a"), chunk("b"), chunk("c"), chunk("d")],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.7, 0.7, 0.0],
            ],
            metric,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_query_orders_and_breaks_ties_by_insertion() {
        let results = index(DistanceMetric::Cosine)
            .query(&[1.0, 0.0, 0.0], 3)
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(results[2].rank, 2);
    }

    #[test]
    fn test_l2_metric() {
        let results = index(DistanceMetric::L2).query(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].chunk.id, "b");
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_k_larger_than_index_and_zero() {
        let idx = index(DistanceMetric::Cosine);
        assert_eq!(idx.query(&[0.0, 0.0, 1.0], 10).unwrap().len(), 4);
        assert!(idx.query(&[0.0, 0.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_build_rejects_bad_batches() {
        let err = VectorIndex::build(vec![], vec![], DistanceMetric::Cosine, "m").unwrap_err();
        assert_eq!(err.kind(), "EmptyCorpusError");

        let err = VectorIndex::build(
            vec![chunk("a"), chunk("b")],
            vec![vec![1.0, 0.0], vec![1.0]],
            DistanceMetric::Cosine,
            "m",
        )
        .unwrap_err();
        assert_eq!(err.kind(), "DimensionMismatchError");

        let err = VectorIndex::build(
            vec![chunk("a")],
            vec![vec![1.0], vec![2.0]],
            DistanceMetric::Cosine,
            "m",
        )
        .unwrap_err();
        assert_eq!(err.kind(), "IngestionError");
    }

    #[test]
    fn test_vector_accessor() {
        let idx = index(DistanceMetric::Cosine);
        assert_eq!(idx.vector(1), Some(&[0.0, 1.0, 0.0][..]));
        assert_eq!(idx.vector(4), None);
    }
}
