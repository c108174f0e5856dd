//! Document session and chat transcript state.
//!
//! The server tracks a single document session shared across all requests in the process.
//! Each upload replaces the session wholesale; nothing is persisted, so a restart loses
//! the indexed content and the transcript. That single-tenant model is only suitable for
//! a single-user local deployment.

use crate::index::EmbeddingIndex;
use serde::Serialize;
use std::sync::Arc;

/// The most recently indexed document.
#[derive(Debug)]
pub struct DocumentSession {
    /// Original filename of the upload.
    pub filename: String,
    /// Full extracted plain text.
    pub text: String,
    /// Embedding index over the document's sentence chunks.
    pub index: EmbeddingIndex,
}

/// One entry in the chat transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message text.
    pub text: String,
    /// Whether the message was written by the user (as opposed to the assistant).
    pub from_user: bool,
}

/// Mutable session state guarded by the service's lock.
///
/// The document is held behind an `Arc` so a query can take a cheap clone under the read
/// lock and search outside it, while an upload publishes a fully built replacement with a
/// single pointer swap under the write lock.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    /// Current document, if any upload has completed.
    pub document: Option<Arc<DocumentSession>>,
    /// Append-only chat transcript, cleared by an explicit reset.
    pub history: Vec<ChatMessage>,
}
