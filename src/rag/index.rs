//! In-memory retrieval index over the reference corpus.
//!
//! Documents are chunked and embedded once at load time; queries embed the
//! query text and rank chunks by cosine similarity. Retrieval never errors
//! outward: an unloaded index, a failed embedding, or a query with no
//! overlap all come back as "zero chunks" and the caller demotes to direct
//! generation.

use serde::{Deserialize, Serialize};

use super::embedding::EmbeddingModel;

/// Provenance attached to every document and chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

/// A reference document to be indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// A chunk returned from a similarity query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub score: f32,
}

struct IndexedChunk {
    content: String,
    metadata: DocumentMetadata,
    embedding: Vec<f32>,
}

/// Chunk bounds: documents are split into ≤ `MAX_CHUNK_CHARS` pieces along
/// line boundaries, and trailing fragments under `MIN_CHUNK_CHARS` are
/// merged backward.
const MAX_CHUNK_CHARS: usize = 500;
const MIN_CHUNK_CHARS: usize = 20;

/// Embedded reference corpus answering similarity queries.
pub struct RetrievalIndex {
    embedder: Box<dyn EmbeddingModel + Send + Sync>,
    chunks: Vec<IndexedChunk>,
}

impl RetrievalIndex {
    pub fn new(embedder: Box<dyn EmbeddingModel + Send + Sync>) -> Self {
        Self {
            embedder,
            chunks: Vec::new(),
        }
    }

    /// Index with the default hashed term-frequency embedder.
    pub fn with_default_embedder() -> Self {
        Self::new(Box::new(super::embedding::HashedBagEmbedder::default()))
    }

    /// Chunk and embed the given documents. Returns whether anything was
    /// indexed; chunks whose embedding fails are skipped with a warning.
    pub fn load_documents(&mut self, documents: &[ReferenceDocument]) -> bool {
        let before = self.chunks.len();

        for document in documents {
            for piece in chunk_text(&document.content, MAX_CHUNK_CHARS, MIN_CHUNK_CHARS) {
                match self.embedder.embed(&piece) {
                    Ok(embedding) => self.chunks.push(IndexedChunk {
                        content: piece,
                        metadata: document.metadata.clone(),
                        embedding,
                    }),
                    Err(e) => {
                        tracing::warn!(topic = %document.metadata.topic, error = %e, "skipping chunk — embedding failed");
                    }
                }
            }
        }

        let added = self.chunks.len() - before;
        tracing::info!(documents = documents.len(), chunks = added, "reference corpus indexed");
        added > 0
    }

    /// Whether the index can answer queries at all.
    pub fn is_ready(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Top-k most similar chunks. Empty on no match or embedding failure,
    /// never an error.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<RetrievedChunk> {
        if !self.is_ready() || top_k == 0 {
            return Vec::new();
        }

        let query_embedding = match self.embedder.embed(text) {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed — treating as zero chunks");
                return Vec::new();
            }
        };

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(&query_embedding, &chunk.embedding), chunk))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, chunk)| RetrievedChunk {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                score,
            })
            .collect()
    }
}

/// Split text into chunks along line boundaries.
fn chunk_text(content: &str, max_chars: usize, min_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        let line = line.trim_end();
        if !current.is_empty() && current.len() + line.len() + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }

    // Merge a tiny trailing fragment into its predecessor
    if chunks.len() >= 2 && chunks[chunks.len() - 1].len() < min_chars {
        let tail = chunks.pop().unwrap_or_default();
        if let Some(last) = chunks.last_mut() {
            last.push('\n');
            last.push_str(&tail);
        }
    }

    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
