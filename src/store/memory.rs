//! In-memory [`DocumentStore`] for tests.
//!
//! A `Vec` behind `RwLock`, sequential numeric ids, brute-force cosine
//! search. Search semantics mirror the SQLite store so integration tests can
//! swap it in behind the trait.

use std::collections::BTreeSet;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{CorpusStats, NewChunk, SearchCandidate};

use super::DocumentStore;

struct StoredChunk {
    id: String,
    content: String,
    source: String,
    embedding: Vec<f32>,
    topic: Option<String>,
    project: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    chunks: RwLock<Vec<StoredChunk>>,
    /// When set, the next insert fails — for exercising write-failure paths.
    fail_next_insert: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`insert_chunks`](DocumentStore::insert_chunks) call fail.
    pub fn fail_next_insert(&self) {
        *self.fail_next_insert.write().unwrap() = true;
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_chunks(&self, chunks: &[NewChunk]) -> Result<usize> {
        {
            let mut fail = self.fail_next_insert.write().unwrap();
            if *fail {
                *fail = false;
                anyhow::bail!("simulated insert failure");
            }
        }

        let mut stored = self.chunks.write().unwrap();
        for chunk in chunks {
            let id = (stored.len() + 1).to_string();
            stored.push(StoredChunk {
                id,
                content: chunk.content.clone(),
                source: chunk.source.clone(),
                embedding: chunk.embedding.clone(),
                topic: chunk.topic.clone(),
                project: chunk.project.clone(),
            });
        }
        Ok(chunks.len())
    }

    async fn similarity_search(
        &self,
        query_vec: &[f32],
        threshold: f64,
        limit: usize,
        topic: Option<&str>,
        project: Option<&str>,
    ) -> Result<Vec<SearchCandidate>> {
        let stored = self.chunks.read().unwrap();
        let mut candidates: Vec<SearchCandidate> = stored
            .iter()
            .filter(|c| topic.is_none_or(|t| c.topic.as_deref() == Some(t)))
            .filter(|c| project.is_none_or(|p| c.project.as_deref() == Some(p)))
            .filter_map(|c| {
                let similarity = cosine_similarity(query_vec, &c.embedding) as f64;
                (similarity >= threshold).then(|| SearchCandidate {
                    id: c.id.clone(),
                    content: c.content.clone(),
                    source: c.source.clone(),
                    similarity,
                    topic: c.topic.clone(),
                    project: c.project.clone(),
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn topics(&self) -> Result<Vec<String>> {
        let stored = self.chunks.read().unwrap();
        let set: BTreeSet<String> = stored.iter().filter_map(|c| c.topic.clone()).collect();
        Ok(set.into_iter().collect())
    }

    async fn projects(&self) -> Result<Vec<String>> {
        let stored = self.chunks.read().unwrap();
        let set: BTreeSet<String> = stored.iter().filter_map(|c| c.project.clone()).collect();
        Ok(set.into_iter().collect())
    }

    async fn stats(&self) -> Result<CorpusStats> {
        let (total_chunks, files, topics, projects) = {
            let stored = self.chunks.read().unwrap();
            let files: BTreeSet<String> = stored.iter().map(|c| c.source.clone()).collect();
            let topics: BTreeSet<String> = stored.iter().filter_map(|c| c.topic.clone()).collect();
            let projects: BTreeSet<String> =
                stored.iter().filter_map(|c| c.project.clone()).collect();
            (stored.len() as u64, files, topics, projects)
        };
        Ok(CorpusStats {
            total_chunks,
            total_files: files.len() as u64,
            files: files.into_iter().collect(),
            topics: topics.into_iter().collect(),
            projects: projects.into_iter().collect(),
        })
    }
}
