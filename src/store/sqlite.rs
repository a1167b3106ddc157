//! SQLite-backed [`DocumentStore`].
//!
//! Embeddings are stored as little-endian f32 BLOBs; similarity search is a
//! brute-force cosine scan over all stored vectors, done in Rust. That is
//! the right trade for a corpus of marketing documents measured in
//! thousands of chunks, and it keeps the schema portable.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{CorpusStats, NewChunk, SearchCandidate};

use super::DocumentStore;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` with a WAL-mode pool.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the schema. Idempotent; run by `synapse init`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                embedding BLOB NOT NULL,
                topic TEXT,
                project TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_topic ON documents(topic)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_project ON documents(project)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_chunks(&self, chunks: &[NewChunk]) -> Result<usize> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO documents (id, content, source, embedding, topic, project, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(vec_to_blob(&chunk.embedding))
            .bind(&chunk.topic)
            .bind(&chunk.project)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
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
        let rows = sqlx::query(
            "SELECT id, content, source, embedding, topic, project FROM documents",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<SearchCandidate> = rows
            .iter()
            .filter_map(|row| {
                let row_topic: Option<String> = row.get("topic");
                let row_project: Option<String> = row.get("project");
                if let Some(t) = topic {
                    if row_topic.as_deref() != Some(t) {
                        return None;
                    }
                }
                if let Some(p) = project {
                    if row_project.as_deref() != Some(p) {
                        return None;
                    }
                }

                let blob: Vec<u8> = row.get("embedding");
                let similarity = cosine_similarity(query_vec, &blob_to_vec(&blob)) as f64;
                if similarity < threshold {
                    return None;
                }

                Some(SearchCandidate {
                    id: row.get("id"),
                    content: row.get("content"),
                    source: row.get("source"),
                    similarity,
                    topic: row_topic,
                    project: row_project,
                })
            })
            .collect();

        // Similarity desc, id asc for a deterministic order on ties.
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
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT topic FROM documents WHERE topic IS NOT NULL ORDER BY topic",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn projects(&self) -> Result<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT project FROM documents WHERE project IS NOT NULL ORDER BY project",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn stats(&self) -> Result<CorpusStats> {
        let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        let files: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT source FROM documents ORDER BY source")
                .fetch_all(&self.pool)
                .await?;

        Ok(CorpusStats {
            total_chunks: total_chunks as u64,
            total_files: files.len() as u64,
            files,
            topics: self.topics().await?,
            projects: self.projects().await?,
        })
    }
}
