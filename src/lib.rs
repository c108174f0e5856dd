#![deny(missing_docs)]

//! Core library for the SnapQA document question-answering server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Format-specific text extraction for uploaded documents.
pub mod extract;
/// Chat-completion client used for summaries and answers.
pub mod generation;
/// In-memory exact nearest-neighbor index over chunk embeddings.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and question counters.
pub mod metrics;
/// Document session state and the retrieval-augmented QA pipeline.
pub mod processing;
