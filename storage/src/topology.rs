//! Whole-graph structure: components, weight-restricted clusters and summary statistics.

use crate::error::GraphError;
use crate::index::KnowledgeGraph;
use chunkgraph_core::model::{Edge, RelationshipType};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, VecDeque};

const MOST_SIMILAR_PAIRS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipCounts {
    pub semantic: usize,
    pub text: usize,
    pub hierarchical: usize,
    pub mention: usize,
}

impl RelationshipCounts {
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Self {
        let mut counts = Self::default();
        for edge in edges {
            counts.record(edge.relationship_type);
        }
        counts
    }

    pub fn record(&mut self, relationship_type: RelationshipType) {
        match relationship_type {
            RelationshipType::Semantic => self.semantic += 1,
            RelationshipType::Text => self.text += 1,
            RelationshipType::Hierarchical => self.hierarchical += 1,
            RelationshipType::Mention => self.mention += 1,
        }
    }

    pub fn get(&self, relationship_type: RelationshipType) -> usize {
        match relationship_type {
            RelationshipType::Semantic => self.semantic,
            RelationshipType::Text => self.text,
            RelationshipType::Hierarchical => self.hierarchical,
            RelationshipType::Mention => self.mention,
        }
    }

    pub fn total(&self) -> usize {
        self.semantic + self.text + self.hierarchical + self.mention
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedPair {
    pub source: String,
    pub target: String,
    pub weight: f32,
    pub relationship_type: RelationshipType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub avg_degree: f64,
    pub clustering_coefficient: f64,
    pub connected_components: usize,
    pub largest_component_size: usize,
    /// `(id, degree)` of the highest-degree node, ties by id.
    pub most_connected_node: Option<(String, usize)>,
    pub most_similar_pairs: Vec<WeightedPair>,
    pub relationship_counts: RelationshipCounts,
}

impl KnowledgeGraph {
    /// Maximal connected node sets, largest first, ties by smallest member id.
    pub fn connected_components(&self) -> Vec<BTreeSet<String>> {
        self.components_where(|_, _| true)
    }

    /// Components of the view that keeps only edges with `weight >= threshold`.
    /// Nodes without such an edge come back as singletons.
    pub fn find_semantic_clusters(&self, threshold: f32) -> Vec<Vec<String>> {
        self.components_where(|a, b| {
            self.strongest_link(a, b)
                .is_some_and(|weight| weight >= threshold)
        })
        .into_iter()
        .map(|component| component.into_iter().collect())
        .collect()
    }

    fn components_where<F>(&self, keep: F) -> Vec<BTreeSet<String>>
    where
        F: Fn(&str, &str) -> bool,
    {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.node_ids() {
            if !visited.insert(start) {
                continue;
            }

            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                component.insert(current.to_string());
                for neighbor in self.adjacent_ids(current) {
                    if keep(current, neighbor) && visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
            components.push(component);
        }

        // Starts are visited in id order, so a stable sort keeps smallest-id ties first.
        components.sort_by(|a, b| b.len().cmp(&a.len()));
        components
    }

    /// Fraction of neighbor pairs that are themselves linked; 0 below degree 2.
    pub fn local_clustering_coefficient(&self, id: &str) -> Result<f64, GraphError> {
        if !self.contains_node(id) {
            return Err(GraphError::NotFound(id.to_string()));
        }
        Ok(self.clustering_of(id))
    }

    fn clustering_of(&self, id: &str) -> f64 {
        let neighbors: Vec<&str> = self.adjacent_ids(id).collect();
        let k = neighbors.len();
        if k < 2 {
            return 0.0;
        }

        let mut linked = 0usize;
        for (i, a) in neighbors.iter().enumerate() {
            for b in &neighbors[i + 1..] {
                if self.are_adjacent(a, b) {
                    linked += 1;
                }
            }
        }
        let possible = k * (k - 1) / 2;
        linked as f64 / possible as f64
    }

    pub fn calculate_statistics(&self) -> GraphStatistics {
        let n = self.node_count();
        let e = self.edge_count();

        let density = if n >= 2 {
            (2 * e) as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };
        let avg_degree = if n >= 1 { (2 * e) as f64 / n as f64 } else { 0.0 };
        let clustering_coefficient = if n >= 1 {
            self.node_ids().map(|id| self.clustering_of(id)).sum::<f64>() / n as f64
        } else {
            0.0
        };

        let components = self.connected_components();
        let most_connected_node = self
            .node_ids()
            .map(|id| (id, self.degree(id)))
            .fold(None, |best: Option<(&str, usize)>, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })
            .map(|(id, degree)| (id.to_string(), degree));

        GraphStatistics {
            node_count: n,
            edge_count: e,
            density,
            avg_degree,
            clustering_coefficient,
            connected_components: components.len(),
            largest_component_size: components.first().map_or(0, BTreeSet::len),
            most_connected_node,
            most_similar_pairs: self.heaviest_edges(MOST_SIMILAR_PAIRS),
            relationship_counts: RelationshipCounts::from_edges(self.edges()),
        }
    }

    fn heaviest_edges(&self, limit: usize) -> Vec<WeightedPair> {
        let mut ranked: Vec<&Edge> = self.edges().iter().collect();
        ranked.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.target.cmp(&b.target))
        });
        ranked
            .into_iter()
            .take(limit)
            .map(|edge| WeightedPair {
                source: edge.source.clone(),
                target: edge.target.clone(),
                weight: edge.weight,
                relationship_type: edge.relationship_type,
            })
            .collect()
    }
}
