//! Retrieval-augmented response generation.
//!
//! `index` holds the embedded reference corpus, `responder` runs the
//! three-tier cascade (retrieval-augmented → direct → fixed fallback), and
//! `prompt` builds every prompt the cascade sends.

pub mod embedding;
pub mod index;
pub mod prompt;
pub mod responder;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),
}

pub use embedding::{EmbeddingModel, HashedBagEmbedder};
pub use index::{DocumentMetadata, ReferenceDocument, RetrievalIndex, RetrievedChunk};
pub use responder::{GeneratedReply, ResponseTier, SupportResponder};
