//! Error and outcome types shared across the pipeline.

use crate::embedding::EmbeddingClientError;
use crate::extract::ExtractError;
use crate::generation::GenerationClientError;
use crate::index::IndexError;
use thiserror::Error;

/// Errors emitted by the document processing pipeline.
///
/// None of these are retried or recovered locally; all propagate to the request boundary
/// as an error response.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The filename extension does not map to a supported format.
    #[error("Unsupported file format: .{0}")]
    UnsupportedFormat(String),
    /// Persisting the raw upload to scratch storage failed.
    #[error("Failed to persist upload to scratch storage: {0}")]
    Scratch(#[source] std::io::Error),
    /// Text extraction failed for the declared format.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractError),
    /// Embedding provider failed to produce vectors.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// The chunk/vector sequences could not be assembled into an index.
    #[error("Failed to build embedding index: {0}")]
    Index(#[from] IndexError),
    /// The external model call failed or returned malformed output.
    #[error("Failed to generate text: {0}")]
    Generation(#[from] GenerationClientError),
    /// A question was asked before any successful upload.
    #[error("No document uploaded. Please upload a file first.")]
    DocumentNotLoaded,
}

/// Summary of a completed upload produced by
/// [`crate::processing::ProcessingService::ingest_document`].
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Original filename of the upload.
    pub filename: String,
    /// Cleaned generated summary of the document.
    pub summary: String,
    /// Number of sentence chunks indexed.
    pub chunk_count: usize,
}
