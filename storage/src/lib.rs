//! In-memory knowledge graph over document chunks.
//!
//! [`KnowledgeGraph`] owns nodes, typed weighted edges and a bidirectional
//! adjacency index. [`GraphBuilder`] populates one from chunk records by
//! linking similar, sequential and explicitly referenced chunks.

pub mod builder;
pub mod error;
pub mod index;
pub mod topology;
pub mod traversal;

pub use builder::{document_sequences, BuildReport, EdgeBatch, GraphBuilder};
pub use error::GraphError;
pub use index::KnowledgeGraph;
pub use topology::{GraphStatistics, RelationshipCounts, WeightedPair};
