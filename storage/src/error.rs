use chunkgraph_core::error::{ChunkgraphError, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("edge {from} -> {to} references unknown node {missing}")]
    InvalidReference {
        from: String,
        to: String,
        missing: String,
    },
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("edge on node {0} points back to itself")]
    SelfLoop(String),
    #[error("edge {from} -> {to} has weight {weight} outside [0, 1]")]
    InvalidWeight { from: String, to: String, weight: f32 },
}

impl ChunkgraphError for GraphError {
    fn error_code(&self) -> ErrorCode {
        match self {
            GraphError::InvalidReference { .. }
            | GraphError::SelfLoop(_)
            | GraphError::InvalidWeight { .. } => ErrorCode::InvalidArgument,
            GraphError::NotFound(_) => ErrorCode::NotFound,
        }
    }
}
