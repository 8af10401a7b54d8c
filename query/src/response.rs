//! Plain serializable shapes handed to whatever transport sits on top of the service.

use crate::analyzer::{GraphPath, PathOutcome};
use crate::search::SearchHit;
use chunkgraph_core::model::{Edge, Metadata, Node, NodeKind, RelationshipType};
use serde::Serialize;
use storage::KnowledgeGraph;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub metadata: Metadata,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            text: node.text.clone(),
            kind: node.kind,
            metadata: node.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub weight: f32,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

impl From<&Edge> for EdgeView {
    fn from(edge: &Edge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            weight: edge.weight,
            relationship_type: edge.relationship_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl From<&KnowledgeGraph> for GraphExport {
    fn from(graph: &KnowledgeGraph) -> Self {
        Self {
            nodes: graph.nodes().map(NodeView::from).collect(),
            edges: graph.edges().iter().map(EdgeView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicsResponse {
    pub clusters: Vec<Vec<String>>,
    pub cluster_count: usize,
}

impl From<Vec<Vec<String>>> for TopicsResponse {
    fn from(clusters: Vec<Vec<String>>) -> Self {
        Self {
            cluster_count: clusters.len(),
            clusters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathNode {
    pub id: String,
    pub text: String,
}

/// `path` and `length` are `None` when the endpoints are in different components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResponse {
    pub path: Option<Vec<String>>,
    pub length: Option<usize>,
    pub nodes: Vec<PathNode>,
}

impl PathResponse {
    pub fn from_outcome(outcome: PathOutcome, graph: &KnowledgeGraph) -> Self {
        match outcome {
            PathOutcome::Found(GraphPath { nodes, length }) => {
                let views = nodes
                    .iter()
                    .filter_map(|id| graph.node(id))
                    .map(|node| PathNode {
                        id: node.id.clone(),
                        text: node.text_preview(),
                    })
                    .collect();
                Self {
                    path: Some(nodes),
                    length: Some(length),
                    nodes: views,
                }
            }
            PathOutcome::Unreachable => Self {
                path: None,
                length: None,
                nodes: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub nodes: Vec<SearchHit>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn views_use_wire_field_names() {
        let node = Node::new("c1", "text").with_metadata("doc_id", "d1");
        let edge = Edge::new("c1", "c2", RelationshipType::Hierarchical, 0.9);

        let node_json = serde_json::to_value(NodeView::from(&node)).unwrap();
        assert_eq!(node_json["type"], json!("chunk"));
        assert_eq!(node_json["metadata"]["doc_id"], json!("d1"));

        let edge_json = serde_json::to_value(EdgeView::from(&edge)).unwrap();
        assert_eq!(edge_json["type"], json!("hierarchical"));
    }

    #[test]
    fn unreachable_path_serializes_as_nulls() {
        let response = PathResponse::from_outcome(PathOutcome::Unreachable, &KnowledgeGraph::new());
        let value = serde_json::to_value(response).unwrap();
        assert!(value["path"].is_null());
        assert!(value["length"].is_null());
    }
}
