use chunkgraph_core::ingest::{ChunkRecord, Mention};
use chunkgraph_core::model::RelationshipType;
use std::collections::BTreeMap;
use storage::{document_sequences, GraphBuilder, GraphError, KnowledgeGraph};

fn scenario_chunks() -> Vec<ChunkRecord> {
    vec![
        ChunkRecord::new("A", "lithium cells").with_embedding(vec![1.0, 0.0, 0.0]),
        ChunkRecord::new("B", "cell chemistry").with_embedding(vec![0.8, 0.6, 0.0]),
        ChunkRecord::new("C", "grid storage").with_embedding(vec![0.3, 0.683333, 0.665630]),
    ]
}

fn edge_set(graph: &KnowledgeGraph) -> Vec<(String, String, RelationshipType, u32)> {
    let mut edges: Vec<_> = graph
        .edges()
        .iter()
        .map(|edge| {
            let (a, b) = if edge.source <= edge.target {
                (edge.source.clone(), edge.target.clone())
            } else {
                (edge.target.clone(), edge.source.clone())
            };
            (a, b, edge.relationship_type, edge.weight.to_bits())
        })
        .collect();
    edges.sort();
    edges
}

#[test]
fn test_similarity_edges_follow_threshold() {
    let mut builder = GraphBuilder::with_threshold(0.6);
    let graph = builder.build_from_chunks(&scenario_chunks(), None);

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert!((graph.strongest_link("A", "B").unwrap() - 0.8).abs() < 1e-4);
    assert!((graph.strongest_link("B", "C").unwrap() - 0.65).abs() < 1e-4);
    assert!(!graph.are_adjacent("A", "C"));

    let stats = graph.calculate_statistics();
    assert!((stats.density - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(
        graph.shortest_path("A", "C").unwrap(),
        Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
    );
    assert!(graph
        .edges()
        .iter()
        .all(|edge| edge.relationship_type == RelationshipType::Semantic));
}

#[test]
fn test_rebuild_is_idempotent() {
    let chunks = scenario_chunks();
    let mut builder = GraphBuilder::with_threshold(0.6);
    let first = edge_set(builder.build_from_chunks(&chunks, None));
    let second = edge_set(builder.build_from_chunks(&chunks, None));
    assert_eq!(first, second);
    assert_eq!(builder.graph().node_count(), 3);
}

#[test]
fn test_text_overlap_links_chunks_without_embeddings() {
    let chunks = vec![
        ChunkRecord::new("a", "Solid-state batteries improve safety"),
        ChunkRecord::new("b", "solid state batteries improve SAFETY margins"),
        ChunkRecord::new("c", "Unrelated harbour logistics"),
    ];
    let mut builder = GraphBuilder::with_threshold(0.6);
    let graph = builder.build_from_chunks(&chunks, None);

    assert_eq!(graph.edge_count(), 1);
    let edge = &graph.edges()[0];
    assert_eq!(edge.relationship_type, RelationshipType::Text);
    // 5 shared tokens out of 6 distinct
    assert!((edge.weight - 5.0 / 6.0).abs() < 1e-6);
    assert!(edge.metadata.contains_key("raw_similarity"));
    assert_eq!(builder.report().text_edges, 1);
    assert_eq!(builder.report().pairs_compared, 3);
}

#[test]
fn test_doc_id_and_blank_ids_carry_into_nodes() {
    let chunks = vec![
        ChunkRecord::new("", "first").with_doc_id("doc-1"),
        ChunkRecord::new("named", "second").with_metadata("page", 4),
    ];
    let mut builder = GraphBuilder::with_threshold(0.9);
    let graph = builder.build_from_chunks(&chunks, None);

    let first = graph.node("chunk_0").unwrap();
    assert_eq!(first.metadata["doc_id"], "doc-1");
    assert_eq!(graph.node("named").unwrap().metadata["page"], 4);
}

#[test]
fn test_hierarchy_and_mentions_coexist_with_similarity() {
    let chunks = vec![
        ChunkRecord::new("p1", "battery chemistry basics").with_doc_id("doc"),
        ChunkRecord::new("p2", "battery chemistry basics").with_doc_id("doc"),
        ChunkRecord::new("p3", "regulatory outlook").with_doc_id("doc"),
    ];
    let mut builder = GraphBuilder::with_threshold(0.6);
    builder.build_from_chunks(&chunks, None);

    let hierarchy = builder.add_document_hierarchy(&document_sequences(&chunks));
    assert_eq!(hierarchy.added, 2);
    assert!(hierarchy.rejected.is_empty());

    let mentions = builder.add_mention_edges(&[Mention::new("p3", "p1")]);
    assert_eq!(mentions.added, 1);

    let (graph, report) = builder.finish();
    assert_eq!(graph.edges_between("p1", "p2").count(), 2);
    assert_eq!(graph.strongest_link("p1", "p2"), Some(1.0));
    assert_eq!(report.hierarchical_edges, 2);
    assert_eq!(report.mention_edges, 1);

    let sequential = graph
        .edges_between("p2", "p3")
        .find(|edge| edge.relationship_type == RelationshipType::Hierarchical)
        .unwrap();
    assert_eq!(sequential.weight, 0.9);
    assert_eq!(sequential.metadata["document"], "doc");
    assert_eq!(sequential.metadata["sequential"], true);

    let mention = graph.edges_between("p1", "p3").next().unwrap();
    assert_eq!(mention.relationship_type, RelationshipType::Mention);
    assert_eq!(mention.metadata["explicit_reference"], true);
}

#[test]
fn test_invalid_edges_are_reported_not_inserted() {
    let chunks = vec![ChunkRecord::new("a", "x"), ChunkRecord::new("b", "y")];
    let mut builder = GraphBuilder::with_threshold(0.6);
    builder.build_from_chunks(&chunks, None);

    let batch = builder.add_mention_edges(&[
        Mention::new("a", "missing"),
        Mention::new("a", "a"),
        Mention::new("a", "b"),
    ]);
    assert_eq!(batch.added, 1);
    assert_eq!(batch.rejected.len(), 2);
    assert!(matches!(batch.rejected[0], GraphError::InvalidReference { .. }));
    assert!(matches!(batch.rejected[1], GraphError::SelfLoop(_)));

    let mut docs = BTreeMap::new();
    docs.insert("doc".to_string(), vec!["a".to_string(), "ghost".to_string()]);
    let hierarchy = builder.add_document_hierarchy(&docs);
    assert_eq!(hierarchy.added, 0);
    assert_eq!(builder.report().rejected, 3);
    assert_eq!(builder.graph().edge_count(), 1);
}

#[test]
fn test_score_equal_to_threshold_creates_edge() {
    // cos = 0.75 / 1.25, the same f32 as the threshold.
    let chunks = vec![
        ChunkRecord::new("P", "p").with_embedding(vec![1.0, 0.0]),
        ChunkRecord::new("Q", "q").with_embedding(vec![0.75, 1.0]),
    ];
    let mut builder = GraphBuilder::with_threshold(0.6);
    let graph = builder.build_from_chunks(&chunks, None);

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.edges()[0].relationship_type, RelationshipType::Semantic);
    assert_eq!(graph.strongest_link("P", "Q"), Some(0.6));
    assert_eq!(builder.report().semantic_edges, 1);

    let mut stricter = GraphBuilder::with_threshold(0.61);
    assert_eq!(stricter.build_from_chunks(&chunks, None).edge_count(), 0);
}
