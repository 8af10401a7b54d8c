pub mod graph;
pub mod similarity;

pub use graph::{EdgeId, KnowledgeGraph};
pub use similarity::{cosine_similarity, token_overlap, tokenize};
