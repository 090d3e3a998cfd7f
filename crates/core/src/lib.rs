pub mod chunking;
pub mod dataset;
pub mod error;
pub mod ingest;
pub mod models;
pub mod traits;

pub use error::{DefraudError, ProviderFailure, Result};
pub use ingest::CorpusIngestor;
pub use models::{
    Chunk, Document, DocumentMetadata, LabelKind, RawRecord, ScoredChunk, SourceOrigin,
    SourceRef,
};
pub use traits::{ChatModel, Embedder, Message, SearchProvider, WebResult};
