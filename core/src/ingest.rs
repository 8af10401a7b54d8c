use crate::model::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chunk as handed over by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ChunkRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Metadata::new(),
            doc_id: None,
            embedding: None,
        }
    }

    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Id used for the graph node. Records without an id get a positional one.
    pub fn resolved_id(&self, index: usize) -> String {
        if self.id.trim().is_empty() {
            format!("chunk_{index}")
        } else {
            self.id.clone()
        }
    }
}

/// An explicit reference from one chunk to another, produced by reference extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub source_chunk_id: String,
    pub target_chunk_id: String,
}

impl Mention {
    pub fn new(source_chunk_id: impl Into<String>, target_chunk_id: impl Into<String>) -> Self {
        Self {
            source_chunk_id: source_chunk_id.into(),
            target_chunk_id: target_chunk_id.into(),
        }
    }
}
