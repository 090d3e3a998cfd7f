//! Corpus ingestion: raw records to documents to chunks

use crate::chunking::RecursiveSplitter;
use crate::models::{Chunk, Document, DocumentMetadata, RawRecord};
use crate::{DefraudError, Result};
use defraud_config::{ChunkingConfig, DatasetConfig};
use tracing::{debug, info, warn};

pub struct CorpusIngestor {
    splitter: RecursiveSplitter,
    separator: String,
    skip_incomplete: bool,
}

impl CorpusIngestor {
    pub fn new(chunking: &ChunkingConfig, dataset: &DatasetConfig) -> Result<Self> {
        Ok(Self {
            splitter: RecursiveSplitter::new(chunking)?,
            separator: chunking.title_separator.clone(),
            skip_incomplete: dataset.skip_incomplete,
        })
    }

    /// Validate one record and join its title and body.
    pub fn document(&self, record: &RawRecord) -> Result<Document> {
        let at = format!("row {}", record.row);

        let (Some(title), Some(body)) = (record.title.as_deref(), record.body.as_deref()) else {
            let field = if record.title.is_none() { "title" } else { "body" };
            return Err(DefraudError::ingestion(at, format!("missing {field}")));
        };
        let label = record
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| DefraudError::ingestion(&at, "missing label"))?;

        let title = title.trim();
        let body = body.trim();
        let content = match (title.is_empty(), body.is_empty()) {
            (true, true) => {
                return Err(DefraudError::ingestion(at, "title and body are both empty"))
            }
            (false, true) => title.to_string(),
            (true, false) => body.to_string(),
            (false, false) => format!("{title}{}{body}", self.separator),
        };

        let source = record
            .source
            .clone()
            .unwrap_or_else(|| format!("record#{}", record.row));

        Ok(Document {
            id: format!("doc-{}", record.row),
            content,
            metadata: DocumentMetadata {
                label: label.to_string(),
                source,
            },
        })
    }

    /// Validate all records, skipping incomplete ones when configured to.
    pub fn documents(&self, records: &[RawRecord]) -> Result<Vec<Document>> {
        let mut docs = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for record in records {
            match self.document(record) {
                Ok(doc) => docs.push(doc),
                Err(e @ DefraudError::Ingestion { .. }) if self.skip_incomplete => {
                    debug!("skipping: {}", e);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if skipped > 0 {
            warn!("skipped {} incomplete records", skipped);
        }
        Ok(docs)
    }

    /// Split one document into overlapping chunks.
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        self.splitter
            .split(&doc.content)
            .into_iter()
            .enumerate()
            .map(|(ordinal, (start, text))| Chunk {
                id: format!("{}:{}", doc.id, ordinal),
                parent_document_id: doc.id.clone(),
                ordinal,
                text: text.to_string(),
                start_offset: start,
                end_offset: start + text.len(),
                metadata: doc.metadata.clone(),
            })
            .collect()
    }

    /// Records to chunks, in record order.
    pub fn ingest(&self, records: &[RawRecord]) -> Result<Vec<Chunk>> {
        if records.is_empty() {
            return Err(DefraudError::EmptyCorpus("no records to ingest".to_string()));
        }

        let docs = self.documents(records)?;
        if docs.is_empty() {
            return Err(DefraudError::EmptyCorpus(
                "every record was skipped as incomplete".to_string(),
            ));
        }

        let chunks: Vec<Chunk> = docs.iter().flat_map(|d| self.chunk_document(d)).collect();
        info!(
            "ingested {} documents into {} chunks (size {}, overlap {})",
            docs.len(),
            chunks.len(),
            self.splitter.chunk_size(),
            self.splitter.chunk_overlap()
        );
        Ok(chunks)
    }
}
