use crate::cache::AnalysisCache;
use crate::centrality::{
    betweenness_centrality, closeness_centrality, importance_score, normalized_degree,
};
use crate::recommend::{recommend_connections, RelationshipRecommendation};
use crate::search::{search_nodes, SearchHit};
use chunkgraph_core::config::AnalyzerConfig;
use chunkgraph_core::model::NodeKind;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use storage::{GraphError, KnowledgeGraph};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedNode {
    pub node_id: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeAnalysis {
    pub node_id: String,
    pub text_preview: String,
    pub kind: NodeKind,
    pub degree: usize,
    pub betweenness_centrality: f64,
    pub closeness_centrality: f64,
    pub clustering_coefficient: f64,
    pub importance_score: f64,
    pub related_nodes: Vec<RelatedNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarNode {
    pub node_id: String,
    pub text: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphPath {
    pub nodes: Vec<String>,
    /// Edge count, `nodes.len() - 1`.
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Found(GraphPath),
    Unreachable,
}

/// Read-only analysis over one published graph.
///
/// Cheap to clone: the graph and the cache are shared. Analyses are cached under
/// `(generation, node id)`, so binding to a new graph leaves old entries unreachable.
#[derive(Debug, Clone)]
pub struct GraphAnalyzer {
    graph: Arc<KnowledgeGraph>,
    generation: u64,
    config: AnalyzerConfig,
    cache: Arc<AnalysisCache>,
}

impl GraphAnalyzer {
    pub fn new(graph: Arc<KnowledgeGraph>, config: AnalyzerConfig) -> Self {
        Self::with_cache(graph, 0, config, Arc::new(AnalysisCache::default()))
    }

    pub fn with_cache(
        graph: Arc<KnowledgeGraph>,
        generation: u64,
        config: AnalyzerConfig,
        cache: Arc<AnalysisCache>,
    ) -> Self {
        Self {
            graph,
            generation,
            config,
            cache,
        }
    }

    /// Point at a newly built graph under a fresh generation from the shared cache
    /// and purge the entries of every other generation.
    pub fn rebind(&mut self, graph: Arc<KnowledgeGraph>) {
        self.graph = graph;
        self.generation = self.cache.next_generation();
        self.cache.retain_generation(self.generation);
    }

    pub fn graph(&self) -> &Arc<KnowledgeGraph> {
        &self.graph
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze_node(&self, node_id: &str) -> Result<Arc<NodeAnalysis>, GraphError> {
        if let Some(cached) = self.cache.get(self.generation, node_id) {
            return Ok(cached);
        }

        let analysis = Arc::new(self.compute_analysis(node_id)?);
        self.cache.insert(self.generation, Arc::clone(&analysis));
        Ok(analysis)
    }

    fn compute_analysis(&self, node_id: &str) -> Result<NodeAnalysis, GraphError> {
        let graph = self.graph.as_ref();
        let node = graph
            .node(node_id)
            .ok_or_else(|| GraphError::NotFound(node_id.to_string()))?;

        let distances = graph.distances_from(node_id)?;
        let closeness = closeness_centrality(&distances);
        let betweenness = betweenness_centrality(graph, node_id)?;
        let clustering = graph.local_clustering_coefficient(node_id)?;
        let importance = importance_score(
            &self.config.importance,
            normalized_degree(graph, node_id),
            betweenness,
            closeness,
            clustering,
        );

        let related_nodes = graph
            .weighted_neighbors(node_id)?
            .into_iter()
            .take(self.config.related_limit)
            .map(|(node_id, weight)| RelatedNode { node_id, weight })
            .collect();

        Ok(NodeAnalysis {
            node_id: node.id.clone(),
            text_preview: node.text_preview(),
            kind: node.kind,
            degree: graph.degree(node_id),
            betweenness_centrality: betweenness,
            closeness_centrality: closeness,
            clustering_coefficient: clustering,
            importance_score: importance,
            related_nodes,
        })
    }

    /// Up to `limit` neighbors whose strongest link is at least `min_weight`, heaviest first.
    pub fn find_similar_nodes(
        &self,
        node_id: &str,
        limit: usize,
        min_weight: f32,
    ) -> Result<Vec<SimilarNode>, GraphError> {
        let neighbors = self.graph.weighted_neighbors(node_id)?;
        Ok(neighbors
            .into_iter()
            .filter(|(_, weight)| *weight >= min_weight)
            .take(limit)
            .map(|(id, similarity)| SimilarNode {
                text: self
                    .graph
                    .node(&id)
                    .map(|node| node.text_preview())
                    .unwrap_or_default(),
                node_id: id,
                similarity,
            })
            .collect())
    }

    /// The `top_k` nodes by importance score, ties by id.
    pub fn find_key_nodes(&self, top_k: usize) -> Vec<Arc<NodeAnalysis>> {
        let mut analyses: Vec<Arc<NodeAnalysis>> = self
            .graph
            .node_ids()
            .filter_map(|id| self.analyze_node(id).ok())
            .collect();

        analyses.sort_by(|a, b| {
            b.importance_score
                .partial_cmp(&a.importance_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        analyses.truncate(top_k);
        debug!(top_k, generation = self.generation, "ranked key nodes");
        analyses
    }

    /// Clusters at the configured threshold with at least `min_size` members, largest first.
    pub fn find_topic_clusters(&self, min_size: usize) -> Vec<Vec<String>> {
        self.graph
            .find_semantic_clusters(self.config.cluster_threshold)
            .into_iter()
            .filter(|cluster| cluster.len() >= min_size)
            .collect()
    }

    pub fn get_path_between(&self, source: &str, target: &str) -> Result<PathOutcome, GraphError> {
        Ok(match self.graph.shortest_path(source, target)? {
            Some(nodes) => PathOutcome::Found(GraphPath {
                length: nodes.len() - 1,
                nodes,
            }),
            None => PathOutcome::Unreachable,
        })
    }

    /// Induced subgraph on `node_id` and everything within `distance` hops of it.
    pub fn get_subgraph_around_node(
        &self,
        node_id: &str,
        distance: usize,
    ) -> Result<KnowledgeGraph, GraphError> {
        let mut ids: BTreeSet<String> = self.graph.neighbors(node_id, distance)?;
        ids.insert(node_id.to_string());
        Ok(self.graph.induced_subgraph(&ids))
    }

    pub fn recommend_connections(&self, limit: usize) -> Vec<RelationshipRecommendation> {
        recommend_connections(&self.graph, limit)
    }

    pub fn search_nodes(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        search_nodes(&self.graph, query, limit)
    }
}
