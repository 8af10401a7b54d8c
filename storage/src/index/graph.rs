use crate::error::GraphError;
use chunkgraph_core::model::{Edge, Node};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Position of an edge in insertion order.
pub type EdgeId = usize;

/// Neighbor id -> every stored edge linking the pair (one per discovery method).
type Neighborhood = BTreeMap<String, Vec<EdgeId>>;

/// Undirected-by-convention knowledge graph: each edge is stored once, and
/// both endpoints list each other in the adjacency index.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
    adjacency: BTreeMap<String, Neighborhood>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node. Existing edges of a replaced node are kept.
    pub fn add_node(&mut self, node: Node) -> Option<Node> {
        self.adjacency.entry(node.id.clone()).or_default();
        self.nodes.insert(node.id.clone(), node)
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeId, GraphError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint.as_str()) {
                return Err(GraphError::InvalidReference {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if edge.source == edge.target {
            return Err(GraphError::SelfLoop(edge.source));
        }
        if !edge.weight.is_finite() || !(0.0..=1.0).contains(&edge.weight) {
            return Err(GraphError::InvalidWeight {
                from: edge.source,
                to: edge.target,
                weight: edge.weight,
            });
        }

        Ok(self.link(edge))
    }

    fn link(&mut self, edge: Edge) -> EdgeId {
        let edge_id = self.edges.len();
        self.adjacency
            .entry(edge.source.clone())
            .or_default()
            .entry(edge.target.clone())
            .or_default()
            .push(edge_id);
        self.adjacency
            .entry(edge.target.clone())
            .or_default()
            .entry(edge.source.clone())
            .or_default()
            .push(edge_id);
        self.edges.push(edge);
        edge_id
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The graph-owned copy of `id`, borrowed for as long as the graph.
    pub fn stored_id(&self, id: &str) -> Option<&str> {
        self.nodes.get_key_value(id).map(|(key, _)| key.as_str())
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn neighborhood(&self, id: &str) -> Result<&Neighborhood, GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NotFound(id.to_string()));
        }
        // Every node gets an adjacency entry on insert.
        self.adjacency
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    /// Distinct direct neighbors in id order; empty for unknown ids.
    pub fn adjacent_ids(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|neighbors| neighbors.keys().map(String::as_str))
    }

    /// Number of distinct neighbors, regardless of how many edges link each pair.
    pub fn degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map_or(0, BTreeMap::len)
    }

    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|neighbors| neighbors.contains_key(b))
    }

    pub fn edges_between<'a>(&'a self, a: &str, b: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.adjacency
            .get(a)
            .and_then(|neighbors| neighbors.get(b))
            .into_iter()
            .flatten()
            .filter_map(move |edge_id| self.edges.get(*edge_id))
    }

    /// Highest weight among the edges linking `a` and `b`.
    pub fn strongest_link(&self, a: &str, b: &str) -> Option<f32> {
        self.edges_between(a, b).map(|edge| edge.weight).reduce(f32::max)
    }

    /// Node ids reachable within `distance` hops, excluding `id` itself.
    pub fn neighbors(&self, id: &str, distance: usize) -> Result<BTreeSet<String>, GraphError> {
        self.neighborhood(id)?;

        let mut found = BTreeSet::new();
        let mut visited = BTreeSet::from([id]);
        let mut queue = VecDeque::from([(id, 0usize)]);

        while let Some((current, hops)) = queue.pop_front() {
            if hops == distance {
                continue;
            }
            for neighbor in self.adjacent_ids(current) {
                if visited.insert(neighbor) {
                    found.insert(neighbor.to_string());
                    queue.push_back((neighbor, hops + 1));
                }
            }
        }

        Ok(found)
    }

    /// Every edge incident to `id`, in insertion order.
    pub fn edges_for_node(&self, id: &str) -> Result<Vec<&Edge>, GraphError> {
        let neighborhood = self.neighborhood(id)?;
        let mut edge_ids: Vec<EdgeId> = neighborhood.values().flatten().copied().collect();
        edge_ids.sort_unstable();
        Ok(edge_ids
            .into_iter()
            .filter_map(|edge_id| self.edges.get(edge_id))
            .collect())
    }

    /// Distinct neighbors with their strongest edge weight, heaviest first, ties by id.
    pub fn weighted_neighbors(&self, id: &str) -> Result<Vec<(String, f32)>, GraphError> {
        let neighborhood = self.neighborhood(id)?;
        let mut out: Vec<(String, f32)> = neighborhood
            .iter()
            .map(|(neighbor, edge_ids)| {
                let weight = edge_ids
                    .iter()
                    .filter_map(|edge_id| self.edges.get(*edge_id))
                    .map(|edge| edge.weight)
                    .fold(0.0f32, f32::max);
                (neighbor.clone(), weight)
            })
            .collect();

        out.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(out)
    }

    /// Graph restricted to `ids`: those nodes plus every edge with both endpoints inside.
    pub fn induced_subgraph(&self, ids: &BTreeSet<String>) -> KnowledgeGraph {
        let mut subgraph = KnowledgeGraph::new();
        for id in ids {
            if let Some(node) = self.nodes.get(id) {
                subgraph.add_node(node.clone());
            }
        }
        for edge in &self.edges {
            if subgraph.contains_node(&edge.source) && subgraph.contains_node(&edge.target) {
                subgraph.link(edge.clone());
            }
        }
        subgraph
    }
}
