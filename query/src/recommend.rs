use serde::Serialize;
use std::collections::BTreeMap;
use storage::KnowledgeGraph;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipRecommendation {
    pub source: String,
    pub target: String,
    pub score: f64,
    pub common_neighbors: usize,
    pub reason: String,
}

/// Unlinked pairs ranked by shared-neighbor count, ties by `(source, target)`.
///
/// Pairs are discovered through their shared neighbors, so pairs with nothing in
/// common never enter the ranking.
pub fn recommend_connections(graph: &KnowledgeGraph, limit: usize) -> Vec<RelationshipRecommendation> {
    let mut shared: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for hub in graph.node_ids() {
        let neighbors: Vec<&str> = graph.adjacent_ids(hub).collect();
        for (i, a) in neighbors.iter().enumerate() {
            for b in &neighbors[i + 1..] {
                if !graph.are_adjacent(a, b) {
                    *shared.entry((*a, *b)).or_insert(0) += 1;
                }
            }
        }
    }

    let mut ranked: Vec<((&str, &str), usize)> = shared.into_iter().collect();
    // BTreeMap order already is (source, target); a stable sort keeps it for ties.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(limit)
        .map(|((source, target), common)| RelationshipRecommendation {
            source: source.to_string(),
            target: target.to_string(),
            score: common as f64,
            common_neighbors: common,
            reason: format!("shared {common} common neighbors"),
        })
        .collect()
}
