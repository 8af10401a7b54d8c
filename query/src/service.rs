use crate::analyzer::{GraphAnalyzer, NodeAnalysis, SimilarNode};
use crate::cache::AnalysisCache;
use crate::recommend::RelationshipRecommendation;
use crate::response::{EdgeView, GraphExport, NodeView, PathResponse, SearchResponse, TopicsResponse};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use chunkgraph_core::config::{BuilderConfig, GraphConfig};
use chunkgraph_core::error::{ChunkgraphError, ErrorCode};
use chunkgraph_core::ingest::{ChunkRecord, Mention};
use chunkgraph_core::metrics::{MetricsCollector, MetricsSnapshot};
use chunkgraph_core::model::NodeKind;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use storage::{
    document_sequences, BuildReport, GraphBuilder, GraphError, GraphStatistics, KnowledgeGraph,
    RelationshipCounts,
};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

pub const MAX_DISTANCE: usize = 5;
pub const MAX_SIMILAR_LIMIT: usize = 20;
pub const MAX_KEY_NODES: usize = 20;
pub const MAX_RECOMMENDATIONS: usize = 50;
pub const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("chunk source unavailable: {0}")]
    Unavailable(String),
}

/// Where the service pulls chunks (and optional explicit mentions) from on rebuild.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    async fn load_chunks(&self) -> Result<Vec<ChunkRecord>, SourceError>;

    async fn load_mentions(&self) -> Result<Vec<Mention>, SourceError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryChunkSource {
    chunks: RwLock<Vec<ChunkRecord>>,
    mentions: RwLock<Vec<Mention>>,
}

impl InMemoryChunkSource {
    pub fn new(chunks: Vec<ChunkRecord>) -> Self {
        Self {
            chunks: RwLock::new(chunks),
            mentions: RwLock::new(Vec::new()),
        }
    }

    pub fn with_mentions(self, mentions: Vec<Mention>) -> Self {
        Self {
            mentions: RwLock::new(mentions),
            ..self
        }
    }

    pub async fn replace_chunks(&self, chunks: Vec<ChunkRecord>) {
        *self.chunks.write().await = chunks;
    }

    pub async fn replace_mentions(&self, mentions: Vec<Mention>) {
        *self.mentions.write().await = mentions;
    }
}

#[async_trait]
impl ChunkSource for InMemoryChunkSource {
    async fn load_chunks(&self) -> Result<Vec<ChunkRecord>, SourceError> {
        Ok(self.chunks.read().await.clone())
    }

    async fn load_mentions(&self) -> Result<Vec<Mention>, SourceError> {
        Ok(self.mentions.read().await.clone())
    }
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("graph build failed: {0}")]
    Build(String),
    #[error("query worker failed: {0}")]
    Worker(String),
}

impl ChunkgraphError for QueryError {
    fn error_code(&self) -> ErrorCode {
        match self {
            QueryError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            QueryError::Graph(err) => err.error_code(),
            QueryError::Source(_) => ErrorCode::Unavailable,
            QueryError::Build(_) | QueryError::Worker(_) => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSummary {
    pub generation: u64,
    pub node_count: usize,
    pub edge_count: usize,
    pub component_count: usize,
    pub relationship_counts: RelationshipCounts,
    pub pairs_compared: usize,
    pub rejected_edges: usize,
    pub duration_ms: u64,
    /// RFC 3339, UTC.
    pub built_at: String,
}

/// One published graph together with the analyzer bound to it.
#[derive(Debug)]
pub struct GraphSnapshot {
    pub generation: u64,
    pub graph: Arc<KnowledgeGraph>,
    pub analyzer: GraphAnalyzer,
    pub summary: BuildSummary,
}

/// Owns the current graph and serves analysis queries against it.
///
/// The first query on a fresh service builds the graph; later queries reuse the
/// published snapshot until [`GraphService::rebuild`] swaps in a new one.
pub struct GraphService {
    source: Arc<dyn ChunkSource>,
    config: GraphConfig,
    current: RwLock<Option<Arc<GraphSnapshot>>>,
    rebuild_lock: Mutex<()>,
    cache: Arc<AnalysisCache>,
    metrics: MetricsCollector,
}

impl GraphService {
    pub fn new(source: Arc<dyn ChunkSource>, config: GraphConfig) -> Self {
        let metrics = MetricsCollector::default();
        let cache = AnalysisCache::new(config.cache.clone()).with_metrics(metrics.clone());
        Self {
            source,
            config,
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
            cache: Arc::new(cache),
            metrics,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    /// Summary of the published graph, if one has been built.
    pub async fn current_summary(&self) -> Option<BuildSummary> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|snapshot| snapshot.summary.clone())
    }

    /// Reload the source and publish a freshly built graph.
    pub async fn rebuild(&self) -> Result<BuildSummary, QueryError> {
        let _guard = self.rebuild_lock.lock().await;
        let snapshot = self.rebuild_locked().await?;
        Ok(snapshot.summary.clone())
    }

    /// Must be called with `rebuild_lock` held.
    async fn rebuild_locked(&self) -> Result<Arc<GraphSnapshot>, QueryError> {
        let started = Instant::now();

        let loaded = async {
            let chunks = self.source.load_chunks().await?;
            let mentions = self.source.load_mentions().await?;
            Ok::<_, SourceError>((chunks, mentions))
        }
        .await;
        let (chunks, mentions) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(error = %err, "chunk source failed; keeping the published graph");
                return Err(err.into());
            }
        };

        let builder_config = self.config.builder.clone();
        let (graph, report) =
            tokio::task::spawn_blocking(move || build_graph(&builder_config, &chunks, &mentions))
                .await
                .map_err(|err| QueryError::Build(err.to_string()))?;

        let generation = self.cache.next_generation();
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let summary = summarize(&graph, &report, generation, duration_ms);

        let graph = Arc::new(graph);
        let analyzer = GraphAnalyzer::with_cache(
            Arc::clone(&graph),
            generation,
            self.config.analyzer.clone(),
            Arc::clone(&self.cache),
        );
        let snapshot = Arc::new(GraphSnapshot {
            generation,
            graph,
            analyzer,
            summary,
        });

        *self.current.write().await = Some(Arc::clone(&snapshot));
        self.cache.retain_generation(generation);
        self.metrics
            .record_build(duration_ms, snapshot.summary.node_count, snapshot.summary.edge_count);

        info!(
            generation,
            nodes = snapshot.summary.node_count,
            edges = snapshot.summary.edge_count,
            components = snapshot.summary.component_count,
            duration_ms,
            "published graph"
        );
        Ok(snapshot)
    }

    /// The published snapshot, building the first one on demand.
    pub async fn snapshot(&self) -> Result<Arc<GraphSnapshot>, QueryError> {
        if let Some(snapshot) = self.current.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let _guard = self.rebuild_lock.lock().await;
        // Another caller may have finished the first build while we waited.
        if let Some(snapshot) = self.current.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }
        self.rebuild_locked().await
    }

    fn record_latency(&self, started: Instant) {
        let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.metrics.record_query(micros);
    }

    pub async fn statistics(&self) -> Result<GraphStatistics, QueryError> {
        let started = Instant::now();
        let snapshot = self.snapshot().await?;
        let stats = snapshot.graph.calculate_statistics();
        self.record_latency(started);
        Ok(stats)
    }

    pub async fn nodes(&self, kind: Option<NodeKind>) -> Result<Vec<NodeView>, QueryError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .graph
            .nodes()
            .filter(|node| kind.map_or(true, |kind| node.kind == kind))
            .map(NodeView::from)
            .collect())
    }

    pub async fn edges(&self, min_weight: f32) -> Result<Vec<EdgeView>, QueryError> {
        check_weight(min_weight)?;
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .graph
            .edges()
            .iter()
            .filter(|edge| edge.weight >= min_weight)
            .map(EdgeView::from)
            .collect())
    }

    pub async fn graph(&self) -> Result<GraphExport, QueryError> {
        let snapshot = self.snapshot().await?;
        Ok(GraphExport::from(snapshot.graph.as_ref()))
    }

    pub async fn analyze_node(&self, node_id: &str) -> Result<Arc<NodeAnalysis>, QueryError> {
        let started = Instant::now();
        let snapshot = self.snapshot().await?;
        let analysis = snapshot.analyzer.analyze_node(node_id)?;
        self.record_latency(started);
        Ok(analysis)
    }

    pub async fn neighbors(&self, node_id: &str, distance: usize) -> Result<Vec<NodeView>, QueryError> {
        check_range("distance", distance, MAX_DISTANCE)?;
        let snapshot = self.snapshot().await?;
        let ids = snapshot.graph.neighbors(node_id, distance)?;
        Ok(ids
            .iter()
            .filter_map(|id| snapshot.graph.node(id))
            .map(NodeView::from)
            .collect())
    }

    pub async fn similar_nodes(
        &self,
        node_id: &str,
        limit: usize,
        min_weight: f32,
    ) -> Result<Vec<SimilarNode>, QueryError> {
        check_range("limit", limit, MAX_SIMILAR_LIMIT)?;
        check_weight(min_weight)?;
        let started = Instant::now();
        let snapshot = self.snapshot().await?;
        let similar = snapshot
            .analyzer
            .find_similar_nodes(node_id, limit, min_weight)?;
        self.record_latency(started);
        Ok(similar)
    }

    /// Ranks every node; runs on a blocking worker since betweenness is quadratic per node.
    pub async fn key_nodes(&self, top_k: usize) -> Result<Vec<Arc<NodeAnalysis>>, QueryError> {
        check_range("top_k", top_k, MAX_KEY_NODES)?;
        let started = Instant::now();
        let analyzer = self.snapshot().await?.analyzer.clone();
        let ranked = tokio::task::spawn_blocking(move || analyzer.find_key_nodes(top_k))
            .await
            .map_err(|err| QueryError::Worker(err.to_string()))?;
        self.record_latency(started);
        Ok(ranked)
    }

    pub async fn topics(&self) -> Result<TopicsResponse, QueryError> {
        let snapshot = self.snapshot().await?;
        let clusters = snapshot
            .analyzer
            .find_topic_clusters(self.config.analyzer.min_cluster_size);
        Ok(TopicsResponse::from(clusters))
    }

    pub async fn recommendations(&self, limit: usize) -> Result<Vec<RelationshipRecommendation>, QueryError> {
        check_range("limit", limit, MAX_RECOMMENDATIONS)?;
        let started = Instant::now();
        let snapshot = self.snapshot().await?;
        let recommendations = snapshot.analyzer.recommend_connections(limit);
        self.record_latency(started);
        Ok(recommendations)
    }

    pub async fn path(&self, source: &str, target: &str) -> Result<PathResponse, QueryError> {
        let snapshot = self.snapshot().await?;
        let outcome = snapshot.analyzer.get_path_between(source, target)?;
        Ok(PathResponse::from_outcome(outcome, &snapshot.graph))
    }

    pub async fn subgraph(&self, node_id: &str, distance: usize) -> Result<GraphExport, QueryError> {
        check_range("distance", distance, MAX_DISTANCE)?;
        let snapshot = self.snapshot().await?;
        let subgraph = snapshot.analyzer.get_subgraph_around_node(node_id, distance)?;
        Ok(GraphExport::from(&subgraph))
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::InvalidArgument("query must not be empty".into()));
        }
        check_range("limit", limit, MAX_SEARCH_LIMIT)?;
        let started = Instant::now();
        let snapshot = self.snapshot().await?;
        let hits = snapshot.analyzer.search_nodes(query, limit);
        self.record_latency(started);
        Ok(SearchResponse {
            query: query.to_string(),
            count: hits.len(),
            nodes: hits,
        })
    }
}

fn build_graph(
    config: &BuilderConfig,
    chunks: &[ChunkRecord],
    mentions: &[Mention],
) -> (KnowledgeGraph, BuildReport) {
    let mut builder = GraphBuilder::new(config.clone());
    builder.build_from_chunks(chunks, None);
    if config.link_document_sequence {
        builder.add_document_hierarchy(&document_sequences(chunks));
    }
    if !mentions.is_empty() {
        builder.add_mention_edges(mentions);
    }
    builder.finish()
}

fn summarize(graph: &KnowledgeGraph, report: &BuildReport, generation: u64, duration_ms: u64) -> BuildSummary {
    BuildSummary {
        generation,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        component_count: graph.connected_components().len(),
        relationship_counts: RelationshipCounts::from_edges(graph.edges()),
        pairs_compared: report.pairs_compared,
        rejected_edges: report.rejected,
        duration_ms,
        built_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

fn check_range(name: &str, value: usize, max: usize) -> Result<(), QueryError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(QueryError::InvalidArgument(format!(
            "{name} must be between 1 and {max}, got {value}"
        )))
    }
}

fn check_weight(min_weight: f32) -> Result<(), QueryError> {
    if (0.0..=1.0).contains(&min_weight) {
        Ok(())
    } else {
        Err(QueryError::InvalidArgument(format!(
            "min_weight must be between 0 and 1, got {min_weight}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_checks_are_inclusive() {
        assert!(check_range("distance", 1, MAX_DISTANCE).is_ok());
        assert!(check_range("distance", 5, MAX_DISTANCE).is_ok());
        assert!(check_range("distance", 0, MAX_DISTANCE).is_err());
        assert!(check_range("distance", 6, MAX_DISTANCE).is_err());
        assert!(check_weight(0.0).is_ok());
        assert!(check_weight(f32::NAN).is_err());
    }

    #[test]
    fn errors_map_to_stable_codes() {
        let invalid = QueryError::InvalidArgument("x".into());
        assert_eq!(invalid.error_code(), ErrorCode::InvalidArgument);

        let missing = QueryError::from(GraphError::NotFound("n".into()));
        assert_eq!(missing.error_code(), ErrorCode::NotFound);
        assert_eq!(missing.to_string(), "node not found: n");

        let down = QueryError::from(SourceError::Unavailable("db".into()));
        assert_eq!(down.error_code(), ErrorCode::Unavailable);
        assert_eq!(QueryError::Build("panic".into()).error_code(), ErrorCode::Internal);

        let worker = QueryError::Worker("task panicked".into());
        assert_eq!(worker.error_code(), ErrorCode::Internal);
        assert_eq!(worker.to_string(), "query worker failed: task panicked");
    }
}
