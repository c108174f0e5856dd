//! Document session state and the retrieval-augmented QA pipeline.

/// Sentence-boundary chunking.
pub mod chunking;
/// Post-processing applied to raw model summaries.
pub mod cleanup;
/// Pipeline orchestration: ingest, summarize, answer.
pub mod service;
/// Document session and chat transcript state.
pub mod session;
/// Error and outcome types shared across the pipeline.
pub mod types;

pub use service::{ProcessingApi, ProcessingService};
pub use session::{ChatMessage, DocumentSession};
pub use types::{ProcessingError, UploadOutcome};
