use async_trait::async_trait;
use defraud_config::{ChunkingConfig, DatasetConfig, DistanceMetric};
use defraud_core::{
    Chunk, CorpusIngestor, DefraudError, Embedder, ProviderFailure, RawRecord, Result,
};
use defraud_index::{IndexBuilder, IndexPaths, Retriever, TrustPolicy, VectorIndex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DIM: usize = 384;

/// Bag-of-words embedder over a fixed vocabulary, zero-padded to `DIM`.
struct VocabEmbedder {
    vocab: Vec<&'static str>,
    batches: AtomicUsize,
}

impl VocabEmbedder {
    fn new() -> Self {
        Self {
            vocab: vec![
                "election", "results", "certified", "moon", "landing", "was", "staged",
                "vaccine", "contains", "microchip",
            ],
            batches: AtomicUsize::new(0),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if let Some(i) = self.vocab.iter().position(|w| *w == token) {
                v[i] += 1.0;
            }
        }
        v
    }
}

#[async_trait]
impl Embedder for VocabEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model_id(&self) -> String {
        "vocab-test".to_string()
    }
}

struct BrokenEmbedder;

#[async_trait]
impl Embedder for BrokenEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(DefraudError::tool("embedder", ProviderFailure::Unavailable, "down"))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(DefraudError::tool("embedder", ProviderFailure::Unavailable, "down"))
    }

    fn model_id(&self) -> String {
        "broken".to_string()
    }
}

fn ingestor() -> CorpusIngestor {
    CorpusIngestor::new(&ChunkingConfig::default(), &DatasetConfig::default()).unwrap()
}

fn three_documents() -> Vec<Chunk> {
    let records: Vec<RawRecord> = [
        "Election results certified",
        "Moon landing was staged",
        "Vaccine contains microchip",
    ]
    .iter()
    .enumerate()
    .map(|(i, title)| RawRecord::new(i + 1, title, "", if i == 0 { "1" } else { "0" }))
    .collect();
    ingestor().ingest(&records).unwrap()
}

async fn built_index() -> (Arc<VocabEmbedder>, VectorIndex) {
    let embedder = Arc::new(VocabEmbedder::new());
    let index = IndexBuilder::new(embedder.clone(), 2, DistanceMetric::Cosine)
        .build(three_documents())
        .await
        .unwrap();
    (embedder, index)
}

/// Deterministic pseudo-random vectors.
fn lcg_vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut state: u64 = 42;
    (0..n)
        .map(|_| {
            (0..dim)
                .map(|_| {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    ((state >> 33) as f32 / u32::MAX as f32) - 0.25
                })
                .collect()
        })
        .collect()
}

fn synthetic_chunks(n: usize) -> Vec<Chunk> {
    let records: Vec<RawRecord> = (0..n)
        .map(|i| RawRecord::new(i + 1, &format!("headline {i}"), "body", "1"))
        .collect();
    ingestor().ingest(&records).unwrap()
}

#[tokio::test]
async fn election_query_ranks_election_document_first() {
    let (embedder, index) = built_index().await;
    let retriever = Retriever::new(Arc::new(index), embedder, 4);

    let results = retriever.retrieve("Did the election get certified?").await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].chunk.parent_document_id, "doc-1");
    assert_eq!(results[0].chunk.text, "Election results certified");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn empty_record_set_fails_to_build() {
    let err = ingestor().ingest(&[]).unwrap_err();
    assert!(matches!(err, DefraudError::EmptyCorpus(_)));

    let err = IndexBuilder::new(Arc::new(VocabEmbedder::new()), 8, DistanceMetric::Cosine)
        .build(Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DefraudError::EmptyCorpus(_)));
}

#[tokio::test]
async fn wrong_query_dimension_is_rejected() {
    let (_, index) = built_index().await;
    assert_eq!(index.dimension(), 384);

    let err = index.query(&vec![0.1; 768], 4).unwrap_err();
    match err {
        DefraudError::DimensionMismatch { expected, actual } => {
            assert_eq!(expected, 384);
            assert_eq!(actual, 768);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn repeated_queries_return_identical_results() {
    let chunks = synthetic_chunks(50);
    let vectors = lcg_vectors(chunks.len(), 16);
    let index = VectorIndex::build(chunks, vectors, DistanceMetric::Cosine, "lcg").unwrap();
    let query = lcg_vectors(1, 16).remove(0);

    let first = index.query(&query, 10).unwrap();
    for _ in 0..5 {
        let again = index.query(&query, 10).unwrap();
        let a: Vec<(&str, f32)> = first.iter().map(|r| (r.chunk.id.as_str(), r.score)).collect();
        let b: Vec<(&str, f32)> = again.iter().map(|r| (r.chunk.id.as_str(), r.score)).collect();
        assert_eq!(a, b);
    }
}

#[test]
fn scores_are_non_increasing_by_rank() {
    for metric in [DistanceMetric::Cosine, DistanceMetric::L2] {
        let chunks = synthetic_chunks(40);
        let vectors = lcg_vectors(chunks.len(), 8);
        let index = VectorIndex::build(chunks, vectors, metric, "lcg").unwrap();
        for query in lcg_vectors(5, 8) {
            let results = index.query(&query, 40).unwrap();
            assert_eq!(results.len(), 40);
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score, "{metric}: {pair:?}");
            }
        }
    }
}

#[test]
fn identical_vectors_keep_insertion_order() {
    let chunks = synthetic_chunks(5);
    let vectors = vec![vec![1.0, 0.0]; 5];
    let index = VectorIndex::build(chunks, vectors, DistanceMetric::L2, "same").unwrap();
    let ids: Vec<String> = index
        .query(&[1.0, 0.0], 5)
        .unwrap()
        .into_iter()
        .map(|r| r.chunk.id)
        .collect();
    assert_eq!(ids, vec!["doc-1:0", "doc-2:0", "doc-3:0", "doc-4:0", "doc-5:0"]);
}

#[tokio::test]
async fn save_and_load_reproduce_query_results() {
    let (embedder, index) = built_index().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path(), "index");

    let manifest = index.save(&paths).unwrap();
    assert_eq!(manifest.count, 3);
    assert_eq!(manifest.dimension, DIM);
    assert_eq!(manifest.embedding_model, "vocab-test");
    assert!(paths.exists());

    let loaded = VectorIndex::load(&paths, TrustPolicy::Verify).unwrap();
    assert_eq!(loaded.chunks(), index.chunks());
    assert_eq!(loaded.metric(), index.metric());

    let query = embedder.embed("moon landing").await.unwrap();
    let before: Vec<(String, f32)> = index
        .query(&query, 3)
        .unwrap()
        .into_iter()
        .map(|r| (r.chunk.id, r.score))
        .collect();
    let after: Vec<(String, f32)> = loaded
        .query(&query, 3)
        .unwrap()
        .into_iter()
        .map(|r| (r.chunk.id, r.score))
        .collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn tampered_chunks_rejected_unless_trusted() {
    let (_, index) = built_index().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path(), "news");
    index.save(&paths).unwrap();

    let original = std::fs::read_to_string(paths.chunks()).unwrap();
    std::fs::write(
        paths.chunks(),
        original.replace("Moon landing was staged", "Moon landing was real"),
    )
    .unwrap();

    let err = VectorIndex::load(&paths, TrustPolicy::Verify).unwrap_err();
    assert_eq!(err.kind(), "IndexNotFoundError");
    assert!(err.to_string().contains("checksum mismatch"));

    let trusted = VectorIndex::load(&paths, TrustPolicy::TrustUnverified).unwrap();
    assert_eq!(trusted.chunks()[1].text, "Moon landing was real");
}

#[tokio::test]
async fn inconsistent_vector_file_is_dimension_mismatch() {
    let (_, index) = built_index().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path(), "index");
    index.save(&paths).unwrap();

    let short: Vec<f32> = vec![0.0; DIM * 2];
    std::fs::write(paths.vectors(), bincode::serialize(&short).unwrap()).unwrap();

    let err = VectorIndex::load(&paths, TrustPolicy::TrustUnverified).unwrap_err();
    assert_eq!(err.kind(), "DimensionMismatchError");
}

#[tokio::test]
async fn missing_data_file_is_index_not_found() {
    let (_, index) = built_index().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path(), "index");
    index.save(&paths).unwrap();
    std::fs::remove_file(paths.vectors()).unwrap();

    let err = VectorIndex::load(&paths, TrustPolicy::TrustUnverified).unwrap_err();
    assert_eq!(err.kind(), "IndexNotFoundError");
}

#[tokio::test]
async fn builder_reports_progress_per_batch() {
    let embedder = Arc::new(VocabEmbedder::new());
    let seen = std::sync::Mutex::new(Vec::new());
    IndexBuilder::new(embedder.clone(), 2, DistanceMetric::Cosine)
        .build_with_progress(three_documents(), |done, total| {
            seen.lock().unwrap().push((done, total))
        })
        .await
        .unwrap();

    assert_eq!(embedder.batches.load(Ordering::SeqCst), 2);
    assert_eq!(*seen.lock().unwrap(), vec![(2, 3), (3, 3)]);
}

#[tokio::test]
async fn embedding_failure_aborts_build() {
    let err = IndexBuilder::new(Arc::new(BrokenEmbedder), 2, DistanceMetric::Cosine)
        .build(three_documents())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ToolInvocationError");
}
