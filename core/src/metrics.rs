use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct QueryMetrics {
    pub total_queries: u64,
    pub latencies: VecDeque<u64>, // microseconds
}

#[derive(Debug, Clone, Default)]
pub struct BuildMetrics {
    pub total_builds: u64,
    pub last_build_ms: u64,
    pub last_node_count: usize,
    pub last_edge_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    state: Arc<Mutex<MetricsState>>,
}

#[derive(Debug)]
struct MetricsState {
    query_metrics: QueryMetrics,
    build_metrics: BuildMetrics,
    cache_metrics: CacheMetrics,
    max_history: usize,
}

impl MetricsCollector {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MetricsState {
                query_metrics: QueryMetrics::default(),
                build_metrics: BuildMetrics::default(),
                cache_metrics: CacheMetrics::default(),
                max_history: max_history.max(1),
            })),
        }
    }

    pub fn record_query(&self, latency_us: u64) {
        let mut state = self.lock();
        let max_history = state.max_history;
        let q = &mut state.query_metrics;
        q.total_queries += 1;
        q.latencies.push_back(latency_us);
        if q.latencies.len() > max_history {
            q.latencies.pop_front();
        }
    }

    pub fn record_build(&self, duration_ms: u64, node_count: usize, edge_count: usize) {
        let mut state = self.lock();
        let b = &mut state.build_metrics;
        b.total_builds += 1;
        b.last_build_ms = duration_ms;
        b.last_node_count = node_count;
        b.last_edge_count = edge_count;
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let mut state = self.lock();
        if hit {
            state.cache_metrics.hits += 1;
        } else {
            state.cache_metrics.misses += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        let q = &state.query_metrics;
        let b = &state.build_metrics;
        let c = &state.cache_metrics;

        let mut sorted_latencies: Vec<u64> = q.latencies.iter().copied().collect();
        sorted_latencies.sort_unstable();

        let lookups = c.hits + c.misses;
        let cache_hit_rate = if lookups > 0 {
            c.hits as f32 / lookups as f32
        } else {
            0.0
        };

        MetricsSnapshot {
            total_queries: q.total_queries,
            p50: percentile(&sorted_latencies, 50.0),
            p95: percentile(&sorted_latencies, 95.0),
            p99: percentile(&sorted_latencies, 99.0),
            history_count: q.latencies.len(),
            total_builds: b.total_builds,
            last_build_ms: b.last_build_ms,
            last_node_count: b.last_node_count,
            last_edge_count: b.last_edge_count,
            cache_hits: c.hits,
            cache_misses: c.misses,
            cache_hit_rate,
        }
    }

    // A panic while holding the lock leaves plain counters behind; keep serving them.
    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(1024)
    }
}

fn percentile(sorted: &[u64], p: f32) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((p / 100.0) * (sorted.len() as f32)).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub total_queries: u64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub history_count: usize,
    pub total_builds: u64,
    pub last_build_ms: u64,
    pub last_node_count: usize,
    pub last_edge_count: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_history_is_bounded() {
        let metrics = MetricsCollector::new(3);
        for latency in [10, 20, 30, 40] {
            metrics.record_query(latency);
        }
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_queries, 4);
        assert_eq!(snapshot.history_count, 3);
        assert_eq!(snapshot.p99, 40);
        assert!(snapshot.p95 >= snapshot.p50);
    }

    #[test]
    fn cache_hit_rate_tracks_lookups() {
        let metrics = MetricsCollector::default();
        metrics.record_cache_lookup(true);
        metrics.record_cache_lookup(true);
        metrics.record_cache_lookup(false);
        metrics.record_cache_lookup(true);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 3);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hit_rate, 0.75);
    }

    #[test]
    fn build_records_latest_counts() {
        let metrics = MetricsCollector::default();
        metrics.record_build(12, 3, 2);
        metrics.record_build(7, 5, 4);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_builds, 2);
        assert_eq!(snapshot.last_build_ms, 7);
        assert_eq!(snapshot.last_node_count, 5);
        assert_eq!(snapshot.last_edge_count, 4);
    }

    #[test]
    fn empty_collector_reports_zeroes() {
        let snapshot = MetricsCollector::default().snapshot();
        assert_eq!(snapshot.p50, 0);
        assert_eq!(snapshot.cache_hit_rate, 0.0);
    }
}
