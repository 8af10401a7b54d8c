use crate::analyzer::NodeAnalysis;
use chunkgraph_core::config::CacheConfig;
use chunkgraph_core::metrics::MetricsCollector;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Cache key: entries from an older graph generation are never returned for a newer one.
type AnalysisKey = (u64, String);

/// Concurrent per-node analysis cache shared by every analyzer of a service.
///
/// Reads go straight to the shard; a value is written at most once per key,
/// and two callers racing on the same miss just compute the same result twice.
/// Generation numbers are handed out here so every analyzer sharing the cache
/// gets a distinct one.
#[derive(Debug)]
pub struct AnalysisCache {
    config: CacheConfig,
    entries: DashMap<AnalysisKey, Arc<NodeAnalysis>>,
    generations: AtomicU64,
    metrics: Option<MetricsCollector>,
}

impl AnalysisCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            generations: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// A generation number no earlier caller of this cache has received.
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn get(&self, generation: u64, node_id: &str) -> Option<Arc<NodeAnalysis>> {
        if !self.config.enabled {
            return None;
        }

        let hit = self
            .entries
            .get(&(generation, node_id.to_string()))
            .map(|entry| Arc::clone(entry.value()));
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_lookup(hit.is_some());
        }
        hit
    }

    /// Store `analysis` unless the cache is disabled or full. A full cache first
    /// drops entries of other generations before giving up on the insert.
    pub fn insert(&self, generation: u64, analysis: Arc<NodeAnalysis>) {
        if !self.config.enabled {
            return;
        }

        if self.entries.len() >= self.config.max_entries {
            self.retain_generation(generation);
            if self.entries.len() >= self.config.max_entries {
                debug!(max_entries = self.config.max_entries, "analysis cache full; skipping insert");
                return;
            }
        }

        self.entries
            .entry((generation, analysis.node_id.clone()))
            .or_insert(analysis);
    }

    /// Drop every entry that does not belong to `generation`.
    pub fn retain_generation(&self, generation: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(entry_generation, _), _| *entry_generation == generation);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, generation, "purged stale analysis entries");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
