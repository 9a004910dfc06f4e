pub mod catalog_index;
pub mod embedding_engine;
pub mod ranker;
pub mod service;

pub use catalog_index::CatalogIndex;
pub use embedding_engine::{Embedder, EmbeddingEngine};
pub use ranker::{rank, EmbeddingMatrix, Ranked};
pub use service::{SearchService, DEFAULT_LIMIT};
