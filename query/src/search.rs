use serde::Serialize;
use std::cmp::Ordering;
use storage::index::tokenize;
use storage::KnowledgeGraph;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub node_id: String,
    pub text: String,
    pub score: f32,
}

/// Rank node texts against `query`: a case-insensitive substring match scores 1.0,
/// otherwise the share of query tokens found in the text. Zero scores are dropped.
pub fn search_nodes(graph: &KnowledgeGraph, query: &str, limit: usize) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }
    let query_tokens = tokenize(&needle, 1);

    let mut hits: Vec<SearchHit> = graph
        .nodes()
        .filter_map(|node| {
            let haystack = node.text.to_lowercase();
            let score = if haystack.contains(&needle) {
                1.0
            } else if query_tokens.is_empty() {
                0.0
            } else {
                let text_tokens = tokenize(&haystack, 1);
                let found = query_tokens.intersection(&text_tokens).count();
                found as f32 / query_tokens.len() as f32
            };
            (score > 0.0).then(|| SearchHit {
                node_id: node.id.clone(),
                text: node.text_preview(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    hits.truncate(limit);
    hits
}
