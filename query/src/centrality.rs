//! Per-node centrality measures over unweighted hop distances.

use chunkgraph_core::config::ImportanceWeights;
use std::collections::HashMap;
use storage::{GraphError, KnowledgeGraph};

/// Degree scaled by the largest possible degree, `N - 1`.
pub fn normalized_degree(graph: &KnowledgeGraph, node_id: &str) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    graph.degree(node_id) as f64 / (n - 1) as f64
}

/// `(reachable - 1) / sum of distances` over the node's BFS distance map; 0 when isolated.
pub fn closeness_centrality(distances: &HashMap<&str, usize>) -> f64 {
    let total: usize = distances.values().sum();
    if total == 0 {
        return 0.0;
    }
    (distances.len() - 1) as f64 / total as f64
}

/// Share of unordered pairs of other nodes for which `node_id` lies on at least
/// one shortest path, normalized by `(N-1)(N-2)/2` over the whole graph.
pub fn betweenness_centrality(graph: &KnowledgeGraph, node_id: &str) -> Result<f64, GraphError> {
    let from_node = graph.distances_from(node_id)?;
    let n = graph.node_count();
    if n < 3 {
        return Ok(0.0);
    }

    let mut members: Vec<&str> = from_node
        .keys()
        .copied()
        .filter(|id| *id != node_id)
        .collect();
    members.sort_unstable();

    let mut on_shortest_path = 0usize;
    for (i, s) in members.iter().enumerate() {
        let from_s = graph.distances_from(s)?;
        let via = from_node[s];
        for t in &members[i + 1..] {
            // Same component, so both lookups are present.
            if from_s.get(t).is_some_and(|direct| via + from_node[t] == *direct) {
                on_shortest_path += 1;
            }
        }
    }

    let pairs = (n - 1) * (n - 2) / 2;
    Ok(on_shortest_path as f64 / pairs as f64)
}

pub fn importance_score(
    weights: &ImportanceWeights,
    normalized_degree: f64,
    betweenness: f64,
    closeness: f64,
    clustering: f64,
) -> f64 {
    weights.degree * normalized_degree
        + weights.betweenness * betweenness
        + weights.closeness * closeness
        + weights.clustering * clustering
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkgraph_core::model::{Edge, Node, RelationshipType};

    fn path_graph(ids: &[&str]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        for id in ids {
            graph.add_node(Node::new(*id, ""));
        }
        for pair in ids.windows(2) {
            graph
                .add_edge(Edge::new(pair[0], pair[1], RelationshipType::Semantic, 0.8))
                .unwrap();
        }
        graph
    }

    #[test]
    fn middle_of_a_path_carries_every_pair() {
        let graph = path_graph(&["a", "b", "c"]);
        assert_eq!(betweenness_centrality(&graph, "b").unwrap(), 1.0);
        assert_eq!(betweenness_centrality(&graph, "a").unwrap(), 0.0);
    }

    #[test]
    fn betweenness_counts_pairs_not_paths() {
        // a-b-d and a-c-d: b lies on one of two shortest a..d paths.
        let mut graph = path_graph(&["a", "b", "d"]);
        graph.add_node(Node::new("c", ""));
        graph
            .add_edge(Edge::new("a", "c", RelationshipType::Text, 0.7))
            .unwrap();
        graph
            .add_edge(Edge::new("c", "d", RelationshipType::Text, 0.7))
            .unwrap();

        // Pairs without b: (a,c) (a,d) (c,d); b is on a shortest a..d path only.
        let score = betweenness_centrality(&graph, "b").unwrap();
        assert!((score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn closeness_of_path_endpoints() {
        let graph = path_graph(&["a", "b", "c"]);
        let from_a = graph.distances_from("a").unwrap();
        assert!((closeness_centrality(&from_a) - 2.0 / 3.0).abs() < 1e-12);

        let from_b = graph.distances_from("b").unwrap();
        assert_eq!(closeness_centrality(&from_b), 1.0);

        let mut lonely = KnowledgeGraph::new();
        lonely.add_node(Node::new("x", ""));
        assert_eq!(closeness_centrality(&lonely.distances_from("x").unwrap()), 0.0);
    }

    #[test]
    fn normalized_degree_uses_graph_size() {
        let graph = path_graph(&["a", "b", "c", "d", "e"]);
        assert_eq!(normalized_degree(&graph, "c"), 0.5);
        assert_eq!(normalized_degree(&graph, "a"), 0.25);
    }
}
