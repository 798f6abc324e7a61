//! The embedding and vector-search boundary.
//!
//! The engine only needs two capabilities from this layer: turn text into a
//! vector ([`EmbeddingGenerator`]) and find the nearest entries of a named
//! index ([`VectorIndex`]). Both are traits so tests can script them; the
//! shipped implementations are a local fastembed model and an exact
//! in-memory index.

mod embedding;
mod index;
mod seed;
mod similarity;
mod types;

#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, SUPPORTED_MODELS, parse_embedding_model,
};
pub use index::{InMemoryVectorIndex, VectorIndex};
pub use seed::{SeedSummary, seed_indexes};
pub use similarity::{
    cosine_similarity, l2_distance, normalize, physician_similarity, question_similarity,
};
pub use types::{Neighbor, Score, VECTOR_DIMENSION_384, VectorDimension, VectorError};
