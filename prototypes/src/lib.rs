//! Synthetic chunk corpora for benchmarks and load experiments.

use chunkgraph_core::embedding::topic_embedding;
use chunkgraph_core::ingest::{ChunkRecord, Mention};

const TOPICS: [&str; 6] = [
    "battery chemistry",
    "charging infrastructure",
    "recycling regulation",
    "supply chain",
    "grid storage",
    "vehicle software",
];

/// `documents * chunks_per_document` chunks. Each document sticks to one topic,
/// so embeddings cluster by topic and consecutive chunks share a `doc_id`.
pub fn synthetic_corpus(documents: usize, chunks_per_document: usize, dims: usize) -> Vec<ChunkRecord> {
    let mut chunks = Vec::with_capacity(documents * chunks_per_document);
    for doc in 0..documents {
        let topic = TOPICS[doc % TOPICS.len()];
        let doc_id = format!("doc-{doc}");
        for part in 0..chunks_per_document {
            let id = format!("{doc_id}-chunk-{part}");
            let text = format!("{topic} notes, part {part} of {doc_id}");
            chunks.push(
                ChunkRecord::new(&id, text)
                    .with_doc_id(&doc_id)
                    .with_metadata("topic", topic)
                    .with_embedding(topic_embedding(topic, &id, dims, 0.35)),
            );
        }
    }
    chunks
}

/// Every `stride`-th chunk references the first chunk of the next document.
pub fn synthetic_mentions(chunks: &[ChunkRecord], chunks_per_document: usize, stride: usize) -> Vec<Mention> {
    if chunks_per_document == 0 || stride == 0 {
        return Vec::new();
    }
    chunks
        .iter()
        .enumerate()
        .step_by(stride)
        .filter_map(|(index, chunk)| {
            let next_doc_start = (index / chunks_per_document + 1) * chunks_per_document;
            chunks
                .get(next_doc_start)
                .map(|target| Mention::new(&chunk.id, &target.id))
        })
        .collect()
}
