//! Pipeline error type.
//!
//! Every failure mode of the ingestion and search pipeline gets its own
//! variant, so callers can distinguish caller mistakes (bad format, empty
//! document, degenerate chunk parameters) from infrastructure failures
//! (extraction, embedding backend, store writes). The HTTP layer uses
//! [`PipelineError::is_client_error`] for its status-code mapping.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The file's extension is not one of the supported formats.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The file matched a supported format but its parser failed.
    #[error("failed to extract text from {path}: {cause}")]
    Extraction { path: String, cause: String },

    /// Extraction succeeded but produced no usable text.
    #[error("no extractable text in {0}")]
    NoExtractableText(String),

    /// `size == 0` or `overlap >= size` would make the chunking cursor
    /// advance non-positive.
    #[error("invalid chunk parameters: size {size}, overlap {overlap} (overlap must be < size, size > 0)")]
    InvalidChunkParameters { size: usize, overlap: usize },

    /// The search request is malformed: empty query, out-of-range
    /// threshold, or zero count.
    #[error("invalid search request: {0}")]
    InvalidSearchRequest(String),

    /// The embedding provider failed or returned a malformed batch.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The store rejected the batch write; nothing was persisted.
    #[error("store write failed: {0}")]
    StoreWrite(String),
}

impl PipelineError {
    /// True for failures caused by the caller's input rather than the
    /// system's own components.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedFormat(_)
                | PipelineError::NoExtractableText(_)
                | PipelineError::InvalidChunkParameters { .. }
                | PipelineError::InvalidSearchRequest(_)
        )
    }
}
