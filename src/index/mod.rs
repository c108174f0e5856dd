//! In-memory exact nearest-neighbor index over chunk embeddings.
//!
//! The index keeps two parallel sequences: the embedding vectors and the chunk texts they
//! were produced from. The invariant that both sequences stay the same length and order is
//! enforced at construction, which is the only way to populate an index. A new document's
//! index is always built fully off to the side and then swapped into the session state, so
//! concurrent queries never observe a half-replaced index.

use thiserror::Error;

/// Errors raised while building an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The chunk and vector sequences were not parallel.
    #[error("Chunk/vector length mismatch: {chunks} chunks but {vectors} vectors")]
    LengthMismatch {
        /// Number of chunk texts supplied.
        chunks: usize,
        /// Number of vectors supplied.
        vectors: usize,
    },
    /// A vector did not match the configured embedding dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was built for.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
}

/// Exact Euclidean nearest-neighbor index with a parallel chunk-text sequence.
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<String>,
}

impl EmbeddingIndex {
    /// Build an index from parallel chunk and vector sequences.
    ///
    /// Validates that the sequences are the same length and that every vector has the
    /// expected dimension; insertion order is preserved and later used for tie-breaking.
    pub fn build(
        dimension: usize,
        chunks: Vec<String>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, IndexError> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::LengthMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }

        Ok(Self {
            dimension,
            vectors,
            chunks,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return the positions of the `k` nearest vectors to `query`, by ascending Euclidean
    /// distance, ties broken by insertion order.
    ///
    /// Returns every position when fewer than `k` vectors exist, and an empty vector when
    /// the index is empty. Never fails.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<usize> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, squared_euclidean(query, vector)))
            .collect();

        // Stable sort keeps insertion order for equal distances.
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(position, _)| position)
            .collect()
    }

    /// Return the chunk texts nearest to `query`, concatenated in result order with a
    /// single separating space.
    pub fn context(&self, query: &[f32], k: usize) -> String {
        let texts: Vec<&str> = self
            .search(query, k)
            .into_iter()
            .map(|position| self.chunks[position].as_str())
            .collect();
        texts.join(" ")
    }

    /// Chunk text stored at the given position.
    pub fn chunk(&self, position: usize) -> Option<&str> {
        self.chunks.get(position).map(String::as_str)
    }

    /// Dimension the index was built for.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Squared Euclidean distance; the square root is monotonic and therefore skipped for ranking.
fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}
