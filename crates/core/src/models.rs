use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the labeled news dataset, before validation.
///
/// Empty cells are `None`; `row` is the 1-based data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub row: usize,
    pub title: Option<String>,
    pub body: Option<String>,
    pub label: Option<String>,
    pub source: Option<String>,
}

impl RawRecord {
    pub fn new(row: usize, title: &str, body: &str, label: &str) -> Self {
        Self {
            row,
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            label: Some(label.to_string()),
            source: None,
        }
    }
}

/// Interpretation of a raw label (WELFake: 0 = fake, 1 = real)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelKind {
    Fake,
    Real,
    Other,
}

impl LabelKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "0" | "fake" | "false" => LabelKind::Fake,
            "1" | "real" | "true" => LabelKind::Real,
            _ => LabelKind::Other,
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::Fake => write!(f, "fake"),
            LabelKind::Real => write!(f, "real"),
            LabelKind::Other => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub label: String,
    pub source: String,
}

impl DocumentMetadata {
    pub fn label_kind(&self) -> LabelKind {
        LabelKind::parse(&self.label)
    }
}

/// A validated record: title and body joined into one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// A bounded slice of a document, the unit that is embedded and retrieved.
///
/// `start_offset..end_offset` is the byte range of `text` inside the parent
/// document's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub parent_document_id: String,
    pub ordinal: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub rank: usize,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Corpus,
    Web,
}

/// Something an answer can cite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk id for corpus sources, URL for web sources
    pub id: String,
    pub origin: SourceOrigin,
    /// Article identifier: the dataset `source`/`url` cell, `<stem>#<row>`, or the URL
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SourceRef {
    pub fn corpus(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            origin: SourceOrigin::Corpus,
            source: chunk.metadata.source.clone(),
            label: Some(chunk.metadata.label.clone()),
        }
    }

    pub fn web(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            source: url.clone(),
            id: url,
            origin: SourceOrigin::Web,
            label: None,
        }
    }
}
