//! Embedding seam for the retrieval index.
//!
//! The index only needs "text in, vector out"; what produces the vector is
//! an opaque capability. The default implementation is a deterministic
//! hashed term-frequency embedder, so retrieval works with zero model
//! downloads; a real sentence-embedding model plugs into the same trait.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::RagError;

/// Embedding model abstraction
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
    fn dimension(&self) -> usize;
}

/// Allow `Box<dyn EmbeddingModel>` to be used as `&impl EmbeddingModel`.
impl EmbeddingModel for Box<dyn EmbeddingModel + Send + Sync> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        (**self).embed(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Hashed bag-of-words embedder.
///
/// Lowercased alphanumeric tokens are hashed into a fixed number of buckets
/// and the resulting term-frequency vector is L2-normalized. Deterministic
/// across runs (SipHash with fixed keys), so indexed chunks and queries
/// always live in the same space.
pub struct HashedBagEmbedder {
    dimension: usize,
}

impl HashedBagEmbedder {
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedder needs at least one bucket");
        Self { dimension }
    }
}

impl Default for HashedBagEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingModel for HashedBagEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}
