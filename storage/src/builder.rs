use crate::error::GraphError;
use crate::index::{cosine_similarity, token_overlap, tokenize, KnowledgeGraph};
use chunkgraph_core::config::BuilderConfig;
use chunkgraph_core::ingest::{ChunkRecord, Mention};
use chunkgraph_core::model::{Edge, Node, RelationshipType};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Weight of the link between consecutive chunks of one document.
pub const HIERARCHY_WEIGHT: f32 = 0.9;
/// Weight of an explicit chunk-to-chunk reference.
pub const MENTION_WEIGHT: f32 = 0.8;

/// Outcome of adding a batch of edges: accepted count plus every rejection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeBatch {
    pub added: usize,
    pub rejected: Vec<GraphError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub nodes_added: usize,
    pub pairs_compared: usize,
    pub semantic_edges: usize,
    pub text_edges: usize,
    pub hierarchical_edges: usize,
    pub mention_edges: usize,
    pub rejected: usize,
}

struct Candidate<'a> {
    node: &'a Node,
    tokens: OnceCell<HashSet<String>>,
}

pub struct GraphBuilder {
    config: BuilderConfig,
    graph: KnowledgeGraph,
    report: BuildReport,
}

impl GraphBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            graph: KnowledgeGraph::new(),
            report: BuildReport::default(),
        }
    }

    pub fn with_threshold(similarity_threshold: f32) -> Self {
        Self::new(BuilderConfig {
            similarity_threshold,
            ..BuilderConfig::default()
        })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Replace the graph with one node per chunk plus similarity edges.
    ///
    /// `embeddings`, when given, is parallel to `chunks` and takes precedence over
    /// each record's own embedding. Pairs where both sides carry embeddings of the
    /// same dimension are compared by cosine (`semantic`); every other pair falls
    /// back to token overlap (`text`). Chunks sharing an id collapse into one node,
    /// the later record winning.
    pub fn build_from_chunks(
        &mut self,
        chunks: &[ChunkRecord],
        embeddings: Option<&[Vec<f32>]>,
    ) -> &KnowledgeGraph {
        self.graph = KnowledgeGraph::new();
        self.report = BuildReport::default();

        if chunks.len() > self.config.max_chunks {
            warn!(
                chunks = chunks.len(),
                max_chunks = self.config.max_chunks,
                "chunk count exceeds soft cap; pairwise similarity is quadratic"
            );
        }

        for (index, chunk) in chunks.iter().enumerate() {
            let embedding = embeddings
                .and_then(|all| all.get(index))
                .filter(|embedding| !embedding.is_empty())
                .or(chunk.embedding.as_ref())
                .cloned()
                .unwrap_or_default();

            let mut node = Node::new(chunk.resolved_id(index), chunk.text.clone())
                .with_embedding(embedding);
            node.metadata = chunk.metadata.clone();
            if let Some(doc_id) = &chunk.doc_id {
                node.metadata.insert("doc_id".into(), doc_id.clone().into());
            }
            self.graph.add_node(node);
        }
        self.report.nodes_added = self.graph.node_count();

        let similar = self.similarity_edges();
        for edge in similar {
            let relationship_type = edge.relationship_type;
            match self.graph.add_edge(edge) {
                Ok(_) => self.count_edge(relationship_type),
                Err(err) => {
                    warn!(error = %err, "rejected similarity edge");
                    self.report.rejected += 1;
                }
            }
        }

        info!(
            nodes = self.report.nodes_added,
            semantic_edges = self.report.semantic_edges,
            text_edges = self.report.text_edges,
            threshold = self.config.similarity_threshold,
            "built chunk graph"
        );
        &self.graph
    }

    fn similarity_edges(&mut self) -> Vec<Edge> {
        let threshold = self.config.similarity_threshold;
        let min_token_chars = self.config.min_token_chars;
        let candidates: Vec<Candidate<'_>> = self
            .graph
            .nodes()
            .map(|node| Candidate {
                node,
                tokens: OnceCell::new(),
            })
            .collect();

        let mut edges = Vec::new();
        let mut compared = 0usize;
        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                compared += 1;
                let semantic = match (&a.node.embedding, &b.node.embedding) {
                    (Some(ea), Some(eb)) => cosine_similarity(ea, eb),
                    _ => None,
                };
                let (relationship_type, raw) = match semantic {
                    Some(score) => (RelationshipType::Semantic, score),
                    None => {
                        let ta = a.tokens.get_or_init(|| tokenize(&a.node.text, min_token_chars));
                        let tb = b.tokens.get_or_init(|| tokenize(&b.node.text, min_token_chars));
                        (RelationshipType::Text, token_overlap(ta, tb))
                    }
                };

                let score = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };
                if score >= threshold {
                    edges.push(
                        Edge::new(&a.node.id, &b.node.id, relationship_type, score)
                            .with_metadata("raw_similarity", f64::from(raw)),
                    );
                }
            }
        }

        debug!(pairs = compared, candidates = edges.len(), "compared chunk pairs");
        self.report.pairs_compared = compared;
        edges
    }

    /// Link consecutive chunks of each document with `hierarchical` edges.
    pub fn add_document_hierarchy(&mut self, doc_chunks: &BTreeMap<String, Vec<String>>) -> EdgeBatch {
        let edges = doc_chunks.iter().flat_map(|(doc_id, chunk_ids)| {
            chunk_ids.windows(2).map(move |pair| {
                Edge::new(&pair[0], &pair[1], RelationshipType::Hierarchical, HIERARCHY_WEIGHT)
                    .with_metadata("document", doc_id.as_str())
                    .with_metadata("sequential", true)
            })
        });
        let edges: Vec<Edge> = edges.collect();
        let batch = self.add_batch(edges);
        info!(
            documents = doc_chunks.len(),
            added = batch.added,
            rejected = batch.rejected.len(),
            "added document hierarchy"
        );
        batch
    }

    /// Add one `mention` edge per explicit reference.
    pub fn add_mention_edges(&mut self, mentions: &[Mention]) -> EdgeBatch {
        let edges: Vec<Edge> = mentions
            .iter()
            .map(|mention| {
                Edge::new(
                    &mention.source_chunk_id,
                    &mention.target_chunk_id,
                    RelationshipType::Mention,
                    MENTION_WEIGHT,
                )
                .with_metadata("explicit_reference", true)
            })
            .collect();
        let batch = self.add_batch(edges);
        info!(
            mentions = mentions.len(),
            added = batch.added,
            rejected = batch.rejected.len(),
            "added mention edges"
        );
        batch
    }

    fn add_batch(&mut self, edges: Vec<Edge>) -> EdgeBatch {
        let mut batch = EdgeBatch::default();
        for edge in edges {
            let relationship_type = edge.relationship_type;
            match self.graph.add_edge(edge) {
                Ok(_) => {
                    batch.added += 1;
                    self.count_edge(relationship_type);
                }
                Err(err) => {
                    warn!(error = %err, relationship = %relationship_type, "rejected edge");
                    batch.rejected.push(err);
                }
            }
        }
        self.report.rejected += batch.rejected.len();
        batch
    }

    fn count_edge(&mut self, relationship_type: RelationshipType) {
        let counter = match relationship_type {
            RelationshipType::Semantic => &mut self.report.semantic_edges,
            RelationshipType::Text => &mut self.report.text_edges,
            RelationshipType::Hierarchical => &mut self.report.hierarchical_edges,
            RelationshipType::Mention => &mut self.report.mention_edges,
        };
        *counter += 1;
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn finish(self) -> (KnowledgeGraph, BuildReport) {
        (self.graph, self.report)
    }
}

/// Chunk ids grouped by `doc_id`, each list in input order. Chunks without a
/// document are skipped.
pub fn document_sequences(chunks: &[ChunkRecord]) -> BTreeMap<String, Vec<String>> {
    let mut sequences: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (index, chunk) in chunks.iter().enumerate() {
        if let Some(doc_id) = &chunk.doc_id {
            sequences
                .entry(doc_id.clone())
                .or_default()
                .push(chunk.resolved_id(index));
        }
    }
    sequences
}
