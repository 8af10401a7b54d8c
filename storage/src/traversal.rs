//! Unweighted breadth-first traversal over the knowledge graph.

use crate::error::GraphError;
use crate::index::KnowledgeGraph;
use std::collections::{HashMap, VecDeque};

impl KnowledgeGraph {
    /// Hop distance from `start` to every node reachable from it (itself at 0).
    pub fn distances_from(&self, start: &str) -> Result<HashMap<&str, usize>, GraphError> {
        let start = self
            .stored_id(start)
            .ok_or_else(|| GraphError::NotFound(start.to_string()))?;
        Ok(self.bfs_distances(start))
    }

    pub(crate) fn bfs_distances<'a>(&'a self, start: &'a str) -> HashMap<&'a str, usize> {
        let mut distances = HashMap::from([(start, 0usize)]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let next_hop = distances[current] + 1;
            for neighbor in self.adjacent_ids(current) {
                if !distances.contains_key(neighbor) {
                    distances.insert(neighbor, next_hop);
                    queue.push_back(neighbor);
                }
            }
        }

        distances
    }

    /// Shortest hop path `from ..= to`. `Ok(None)` when the nodes are disconnected.
    /// Neighbors are expanded in id order, so the path is deterministic.
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Option<Vec<String>>, GraphError> {
        for id in [from, to] {
            if !self.contains_node(id) {
                return Err(GraphError::NotFound(id.to_string()));
            }
        }
        if from == to {
            return Ok(Some(vec![from.to_string()]));
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut reached = false;

        'search: while let Some(current) = queue.pop_front() {
            for neighbor in self.adjacent_ids(current) {
                if neighbor == from || parent.contains_key(neighbor) {
                    continue;
                }
                parent.insert(neighbor, current);
                if neighbor == to {
                    reached = true;
                    break 'search;
                }
                queue.push_back(neighbor);
            }
        }

        if !reached {
            return Ok(None);
        }

        let mut path = vec![to.to_string()];
        let mut cursor = to;
        while let Some(&prev) = parent.get(cursor) {
            path.push(prev.to_string());
            cursor = prev;
        }
        path.reverse();
        Ok(Some(path))
    }
}
