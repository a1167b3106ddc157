//! Storage abstraction for document chunks.
//!
//! The [`DocumentStore`] trait covers everything the pipeline and the API
//! need from persistence: one batch insert per ingested document, a
//! similarity search that applies the threshold and metadata filters
//! store-side, and a few metadata listings. Implementations must be
//! `Send + Sync` so they can be shared behind `Arc` across async handlers.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CorpusStats, NewChunk, SearchCandidate};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Abstract chunk store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_chunks`](DocumentStore::insert_chunks) | Batch-insert all chunks of one document |
/// | [`similarity_search`](DocumentStore::similarity_search) | Scored candidates above a threshold, sorted descending |
/// | [`topics`](DocumentStore::topics) | Distinct topics present in the corpus |
/// | [`projects`](DocumentStore::projects) | Distinct projects present in the corpus |
/// | [`stats`](DocumentStore::stats) | Corpus-wide counts |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert all chunk records of one document as a single batch. Ids are
    /// assigned here, not by the caller. Returns the number inserted.
    /// The batch is one failure point: on error nothing is persisted.
    async fn insert_chunks(&self, chunks: &[NewChunk]) -> Result<usize>;

    /// Return up to `limit` candidates whose similarity to `query_vec` is at
    /// least `threshold`, sorted by descending similarity. Optional `topic`
    /// and `project` filters are exact matches applied before the limit.
    async fn similarity_search(
        &self,
        query_vec: &[f32],
        threshold: f64,
        limit: usize,
        topic: Option<&str>,
        project: Option<&str>,
    ) -> Result<Vec<SearchCandidate>>;

    /// Distinct non-null topics, sorted.
    async fn topics(&self) -> Result<Vec<String>>;

    /// Distinct non-null projects, sorted.
    async fn projects(&self) -> Result<Vec<String>>;

    /// Corpus statistics.
    async fn stats(&self) -> Result<CorpusStats>;
}
