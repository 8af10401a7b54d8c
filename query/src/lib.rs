//! Analysis queries over a published chunk graph, plus the service that owns
//! the build-and-publish lifecycle.

pub mod analyzer;
pub mod cache;
pub mod centrality;
pub mod recommend;
pub mod response;
pub mod search;
pub mod service;

pub use analyzer::{GraphAnalyzer, GraphPath, NodeAnalysis, PathOutcome, RelatedNode, SimilarNode};
pub use cache::AnalysisCache;
pub use recommend::RelationshipRecommendation;
pub use search::SearchHit;
pub use service::{
    BuildSummary, ChunkSource, GraphService, GraphSnapshot, InMemoryChunkSource, QueryError,
    SourceError,
};
