//! Concrete service providers and the shared per-process service context.

pub mod context;
pub mod embedder;
mod http;
pub mod llm;
pub mod search;

pub use context::ServiceContext;
pub use embedder::{select_embedder, HashingEmbedder, OllamaEmbedder, OpenAIEmbedder};
pub use llm::{select_chat_model, OllamaProvider, OpenAIProvider};
pub use search::SerpApiProvider;
