//! Pipeline orchestration: ingest, summarize, answer.

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    extract::{self, DocumentFormat},
    generation::{GenerationClient, get_generation_client},
    index::{EmbeddingIndex, IndexError},
    metrics::{IngestMetrics, MetricsSnapshot},
    processing::{
        chunking::split_sentences,
        cleanup::clean_summary,
        session::{ChatMessage, DocumentSession, SessionState},
        types::{ProcessingError, UploadOutcome},
    },
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

const SUMMARY_SYSTEM_PROMPT: &str = "You are an AI assistant that generates professional, \
concise summaries from documents. The summary should be structured in complete sentences, \
avoiding unnecessary details and repetitive content.";

const QA_SYSTEM_PROMPT: &str =
    "You are an AI assistant that answers questions based on document content.";

/// Coordinates the full pipeline: extraction, chunking, embedding, indexing, and the
/// generation calls for summaries and answers.
///
/// The service owns long-lived handles to the embedding and generation clients plus the
/// single shared session slot. Construct it once near process start and share it through
/// an `Arc`; both the HTTP handlers and tests go through the [`ProcessingApi`] trait.
pub struct ProcessingService {
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    generation_client: Box<dyn GenerationClient + Send + Sync>,
    state: RwLock<SessionState>,
    metrics: Arc<IngestMetrics>,
}

/// Abstraction over the processing pipeline used by the HTTP surface.
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Persist, extract, chunk, embed, index, and summarize an uploaded document.
    async fn ingest_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ProcessingError>;

    /// Answer a question grounded in the most recently indexed document.
    async fn answer_question(&self, question: String) -> Result<String, ProcessingError>;

    /// Clear the document session and the chat transcript.
    async fn reset_session(&self);

    /// Return the chat transcript in order.
    async fn history_snapshot(&self) -> Vec<ChatMessage>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build a service using the clients selected by configuration.
    pub fn new() -> Self {
        tracing::info!("Initializing embedding and generation clients");
        Self::with_clients(get_embedding_client(), get_generation_client())
    }

    /// Build a service around explicit clients. Used by tests to inject stubs or clients
    /// pointed at mock servers.
    pub fn with_clients(
        embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
        generation_client: Box<dyn GenerationClient + Send + Sync>,
    ) -> Self {
        Self {
            embedding_client,
            generation_client,
            state: RwLock::new(SessionState::default()),
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Persist, extract, chunk, embed, index, and summarize an uploaded document.
    ///
    /// The replacement session (chunks, vectors, summary) is built entirely off to the
    /// side and only published once every step has succeeded, so a failure anywhere
    /// leaves the previous document queryable and a concurrent question never retrieves
    /// against a half-replaced index.
    pub async fn ingest_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ProcessingError> {
        let config = get_config();
        let extension = filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let format = DocumentFormat::from_extension(&extension)
            .ok_or_else(|| ProcessingError::UnsupportedFormat(extension.clone()))?;
        tracing::info!(filename, %format, size = bytes.len(), "Processing upload");

        // The scratch copy doubles as extraction input; it is intentionally left in place.
        let scratch_path = self.persist_upload(filename, &bytes).await?;
        let text = extract::extract(&scratch_path, format)?;

        let chunks = split_sentences(&text);
        let chunk_count = chunks.len();
        let vectors = self
            .embedding_client
            .generate_embeddings(chunks.clone())
            .await?;
        let index = EmbeddingIndex::build(config.embedding_dimension, chunks, vectors)?;

        let prompt = format!(
            "Summarize the key points from this document in clear, structured sentences:\n\n{text}"
        );
        let raw_summary = self
            .generation_client
            .complete(SUMMARY_SYSTEM_PROMPT, prompt)
            .await?;
        let summary = clean_summary(&raw_summary);

        let session = DocumentSession {
            filename: filename.to_string(),
            text,
            index,
        };
        {
            let mut state = self.state.write().await;
            state.document = Some(Arc::new(session));
        }

        self.metrics.record_document(chunk_count as u64);
        tracing::info!(filename, chunks = chunk_count, "Document indexed");

        Ok(UploadOutcome {
            filename: filename.to_string(),
            summary,
            chunk_count,
        })
    }

    /// Answer a question against the current document via top-k retrieval plus one
    /// generation call.
    pub async fn answer_question(&self, question: String) -> Result<String, ProcessingError> {
        let config = get_config();

        // The transcript is optimistic: the user message is appended before the answer is
        // attempted, so a failed generation leaves it without a reply.
        let document = {
            let mut state = self.state.write().await;
            state.history.push(ChatMessage {
                text: question.clone(),
                from_user: true,
            });
            state.document.clone()
        };
        let document = document.ok_or(ProcessingError::DocumentNotLoaded)?;

        let mut vectors = self
            .embedding_client
            .generate_embeddings(vec![question.clone()])
            .await?;
        let query = vectors.pop().ok_or_else(|| {
            ProcessingError::Embedding(crate::embedding::EmbeddingClientError::InvalidResponse(
                "provider returned no vectors for the query".to_string(),
            ))
        })?;
        if query.len() != document.index.dimension() {
            return Err(ProcessingError::Index(IndexError::DimensionMismatch {
                expected: document.index.dimension(),
                actual: query.len(),
            }));
        }

        let context = document.index.context(&query, config.retrieval_top_k);
        tracing::debug!(
            filename = %document.filename,
            top_k = config.retrieval_top_k,
            context_chars = context.len(),
            "Retrieved context"
        );

        let prompt = format!("Context:\n{context}\n\nQuestion: {question}\nAnswer:");
        let answer = self
            .generation_client
            .complete(QA_SYSTEM_PROMPT, prompt)
            .await?;

        {
            let mut state = self.state.write().await;
            state.history.push(ChatMessage {
                text: answer.clone(),
                from_user: false,
            });
        }
        self.metrics.record_question();

        Ok(answer)
    }

    /// Clear the document session and the chat transcript.
    pub async fn reset_session(&self) {
        let mut state = self.state.write().await;
        state.document = None;
        state.history.clear();
        tracing::info!("Session reset");
    }

    /// Return the chat transcript in order.
    pub async fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.state.read().await.history.clone()
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Write the raw upload into scratch storage, keyed by its final path component so a
    /// crafted filename cannot escape the upload directory.
    async fn persist_upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<std::path::PathBuf, ProcessingError> {
        let config = get_config();
        let stored_name = Path::new(filename)
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "upload".into());

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(ProcessingError::Scratch)?;
        let scratch_path = Path::new(&config.upload_dir).join(stored_name);
        tokio::fs::write(&scratch_path, bytes)
            .await
            .map_err(ProcessingError::Scratch)?;
        Ok(scratch_path)
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn ingest_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ProcessingError> {
        ProcessingService::ingest_document(self, filename, bytes).await
    }

    async fn answer_question(&self, question: String) -> Result<String, ProcessingError> {
        ProcessingService::answer_question(self, question).await
    }

    async fn reset_session(&self) {
        ProcessingService::reset_session(self).await;
    }

    async fn history_snapshot(&self) -> Vec<ChatMessage> {
        ProcessingService::history_snapshot(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}
