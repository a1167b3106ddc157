//! Core data types flowing through the ingestion and retrieval pipeline.

use serde::Serialize;

/// A chunk record ready for insertion. The store assigns its identity at
/// insert time; the pipeline never generates ids.
#[derive(Debug, Clone)]
pub struct NewChunk {
    /// The chunk's raw text. Never empty.
    pub content: String,
    /// Originating filename. Not unique — all chunks of one document share it.
    pub source: String,
    /// Fixed-dimension vector produced once at ingestion, immutable after.
    pub embedding: Vec<f32>,
    pub topic: Option<String>,
    pub project: Option<String>,
}

/// A scored row returned by the store's similarity search. Lives only for
/// the duration of one search request.
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    pub id: String,
    pub content: String,
    pub source: String,
    /// Cosine-similarity-like score in `[0, 1]`.
    pub similarity: f64,
    pub topic: Option<String>,
    pub project: Option<String>,
}

/// Topic and project tags produced by the rule-based classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub topic: Option<String>,
    pub project: Option<String>,
}

/// Result of ingesting a single document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionOutcome {
    pub chunks_created: usize,
    pub topic: Option<String>,
    pub project: Option<String>,
}

/// Tally for a batch-ingestion run over a folder.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub documents_ingested: usize,
    pub documents_failed: usize,
    pub chunks_created: usize,
}

/// Corpus-wide statistics reported by the store.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub total_chunks: u64,
    pub total_files: u64,
    pub files: Vec<String>,
    pub topics: Vec<String>,
    pub projects: Vec<String>,
}
