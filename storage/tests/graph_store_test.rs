use chunkgraph_core::model::{Edge, Node, RelationshipType};
use std::collections::BTreeSet;
use storage::{GraphError, KnowledgeGraph};

fn graph_with_edges(ids: &[&str], edges: &[(&str, &str, f32)]) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    for id in ids {
        graph.add_node(Node::new(*id, format!("chunk {id}")));
    }
    for (source, target, weight) in edges {
        graph
            .add_edge(Edge::new(*source, *target, RelationshipType::Semantic, *weight))
            .unwrap();
    }
    graph
}

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_empty_graph_statistics_are_zero() {
    let stats = KnowledgeGraph::new().calculate_statistics();
    assert_eq!(stats.node_count, 0);
    assert_eq!(stats.edge_count, 0);
    assert_eq!(stats.density, 0.0);
    assert_eq!(stats.connected_components, 0);
    assert!(KnowledgeGraph::new().find_semantic_clusters(0.6).is_empty());
}

#[test]
fn test_four_cycle_has_no_triangles() {
    let graph = graph_with_edges(
        &["A", "B", "C", "D"],
        &[("A", "B", 0.9), ("B", "C", 0.9), ("C", "D", 0.9), ("D", "A", 0.9)],
    );

    for id in ["A", "B", "C", "D"] {
        assert_eq!(graph.degree(id), 2);
        assert_eq!(graph.local_clustering_coefficient(id).unwrap(), 0.0);
    }

    let components = graph.connected_components();
    assert_eq!(components, vec![ids(&["A", "B", "C", "D"])]);

    let stats = graph.calculate_statistics();
    assert_eq!(stats.clustering_coefficient, 0.0);
    assert_eq!(stats.largest_component_size, 4);
}

#[test]
fn test_disjoint_pairs_form_two_components() {
    let graph = graph_with_edges(&["A", "B", "C", "D"], &[("A", "B", 0.8), ("C", "D", 0.8)]);

    assert_eq!(
        graph.connected_components(),
        vec![ids(&["A", "B"]), ids(&["C", "D"])]
    );
    assert_eq!(graph.shortest_path("A", "C").unwrap(), None);
}

#[test]
fn test_density_matches_formula() {
    let graph = graph_with_edges(
        &["a", "b", "c", "d", "e"],
        &[("a", "b", 0.7), ("b", "c", 0.7), ("c", "d", 0.7)],
    );
    let stats = graph.calculate_statistics();
    let expected = 2.0 * 3.0 / (5.0 * 4.0);
    assert!((stats.density - expected).abs() < 1e-12);
    assert!((stats.avg_degree - 6.0 / 5.0).abs() < 1e-12);

    let single = graph_with_edges(&["solo"], &[]);
    assert_eq!(single.calculate_statistics().density, 0.0);
}

#[test]
fn test_clustering_is_bounded() {
    let graph = graph_with_edges(
        &["a", "b", "c", "d"],
        &[("a", "b", 0.7), ("b", "c", 0.7), ("a", "c", 0.7), ("c", "d", 0.7)],
    );
    for id in graph.node_ids() {
        let coefficient = graph.local_clustering_coefficient(id).unwrap();
        assert!((0.0..=1.0).contains(&coefficient));
    }
    assert!((graph.local_clustering_coefficient("c").unwrap() - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(graph.local_clustering_coefficient("d").unwrap(), 0.0);
}

#[test]
fn test_edges_for_missing_node_is_not_found() {
    let graph = graph_with_edges(&["a"], &[]);
    assert_eq!(
        graph.edges_for_node("b").unwrap_err(),
        GraphError::NotFound("b".to_string())
    );
    assert!(graph.edges_for_node("a").unwrap().is_empty());
}

#[test]
fn test_failed_edge_leaves_adjacency_consistent() {
    let mut graph = graph_with_edges(&["a", "b"], &[("a", "b", 0.7)]);
    assert!(graph
        .add_edge(Edge::new("a", "ghost", RelationshipType::Mention, 0.8))
        .is_err());

    for edge in graph.edges() {
        assert!(graph.are_adjacent(&edge.source, &edge.target));
        assert!(graph.are_adjacent(&edge.target, &edge.source));
    }
    assert_eq!(graph.neighbors("a", 5).unwrap(), ids(&["b"]));
}

#[test]
fn test_cluster_threshold_is_inclusive() {
    let graph = graph_with_edges(&["A", "B", "C"], &[("A", "B", 0.75), ("B", "C", 0.5)]);

    let at_weight = graph.find_semantic_clusters(0.75);
    assert_eq!(at_weight[0], vec!["A".to_string(), "B".to_string()]);
    assert_eq!(at_weight.len(), 2);

    let above_weight = graph.find_semantic_clusters(0.76);
    assert_eq!(above_weight.len(), 3);
}
