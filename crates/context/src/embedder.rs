use crate::http::{check_status, client, malformed, transport_error};
use async_trait::async_trait;
use defraud_config::{Credentials, EmbeddingBackend, EmbeddingConfig};
use defraud_core::{DefraudError, Embedder, Result};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::env;
use std::sync::Arc;
use tracing::debug;

const SERVICE: &str = "embedder";

/// Build the embedder named by `config.backend`.
pub fn select_embedder(config: &EmbeddingConfig, creds: &Credentials) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::External => {
            let api_key = creds.embedding_api_key.clone().ok_or_else(|| {
                DefraudError::Configuration(defraud_config::ConfigError::MissingCredential {
                    var: config.api_key_env.clone(),
                    needed_for: "openai embeddings".to_string(),
                })
            })?;
            let api_base = config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
            Ok(Arc::new(OpenAIEmbedder::new(
                config.model_name.clone(),
                api_key,
                api_base,
                config.timeout_secs,
            )?))
        }
        EmbeddingBackend::Ollama => {
            let base_url = config
                .api_base
                .clone()
                .or_else(|| env::var("OLLAMA_BASE_URL").ok())
                .unwrap_or_else(|| "http://localhost:11434".to_string());
            Ok(Arc::new(OllamaEmbedder::new(
                config.model_name.clone(),
                base_url,
                config.timeout_secs,
            )?))
        }
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimension))),
    }
}

pub struct OpenAIEmbedder {
    model: String,
    api_key: String,
    api_base: String,
    client: Client,
}

impl OpenAIEmbedder {
    pub fn new(model: String, api_key: String, api_base: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            model,
            api_key,
            api_base,
            client: client(SERVICE, timeout_secs)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingItem {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut list = self.embed_batch(&[text.to_string()]).await?;
        list.pop()
            .ok_or_else(|| malformed(SERVICE, "empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let resp = self
            .client
            .post(format!("{}/embeddings", self.api_base.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;

        let parsed: OpenAIEmbeddingResponse =
            resp.json().await.map_err(|e| transport_error(SERVICE, e))?;
        if parsed.data.len() != texts.len() {
            return Err(malformed(
                SERVICE,
                format!(
                    "embedding count mismatch: got {}, expected {}",
                    parsed.data.len(),
                    texts.len()
                ),
            ));
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_id(&self) -> String {
        format!("openai:{}", self.model)
    }
}

pub struct OllamaEmbedder {
    model: String,
    base_url: String,
    client: Client,
}

impl OllamaEmbedder {
    pub fn new(model: String, base_url: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            model,
            base_url,
            client: client(SERVICE, timeout_secs)?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let resp = self
            .client
            .post(format!(
                "{}/api/embeddings",
                self.base_url.trim_end_matches('/')
            ))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": text,
            }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;

        let json: serde_json::Value = resp.json().await.map_err(|e| transport_error(SERVICE, e))?;
        let embedding = json["embedding"]
            .as_array()
            .ok_or_else(|| malformed(SERVICE, "no embedding field in Ollama response"))?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|f| f as f32)
            .collect::<Vec<f32>>();
        if embedding.is_empty() {
            return Err(malformed(SERVICE, "Ollama returned an empty embedding"));
        }
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn model_id(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

/// Offline feature-hashing embedder.
///
/// Each lowercased alphanumeric token is hashed with SHA-256 into one of
/// `dimension` buckets with a hash-derived sign; the result is L2-normalised.
/// Identical text always yields the identical vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!("hashing {} texts", texts.len());
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model_id(&self) -> String {
        format!("hashing-{}", self.dimension)
    }
}
