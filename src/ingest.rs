//! Ingestion pipeline: extract → classify → chunk → embed → store.
//!
//! One document flows through [`ingest_document`] as a single unit of work:
//! all records are built in local memory and written in one batch, so a
//! failure at any stage leaves nothing half-persisted. The folder driver
//! [`run_ingest`] processes many documents and never lets one bad file abort
//! the run.

use std::path::Path;

use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::classify::classify;
use crate::embedding::EmbeddingProvider;
use crate::error::PipelineError;
use crate::extract::{self, SUPPORTED_EXTENSIONS};
use crate::models::{IngestSummary, IngestionOutcome, NewChunk};
use crate::store::DocumentStore;

/// Ingest a single document.
///
/// Caller-supplied `topic`/`project` always win; the classifier fills only
/// the missing field(s). Chunking uses `size`/`overlap` in characters.
/// All chunks are embedded in one batched call and inserted in one batch
/// write; no retry happens at this layer.
pub async fn ingest_document(
    store: &dyn DocumentStore,
    embedder: &dyn EmbeddingProvider,
    path: &Path,
    size: usize,
    overlap: usize,
    topic: Option<String>,
    project: Option<String>,
) -> Result<IngestionOutcome, PipelineError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let text = extract::extract_text(path)?;
    if text.trim().is_empty() {
        return Err(PipelineError::NoExtractableText(filename));
    }

    let (topic, project) = if topic.is_none() || project.is_none() {
        let auto = classify(&text, &filename);
        (topic.or(auto.topic), project.or(auto.project))
    } else {
        (topic, project)
    };

    let chunks = chunk_text(&text, size, overlap)?;

    let embeddings = embedder
        .embed(&chunks)
        .await
        .map_err(|e| PipelineError::Embedding(e.to_string()))?;
    if embeddings.len() != chunks.len() {
        return Err(PipelineError::Embedding(format!(
            "expected {} vectors, got {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    let records: Vec<NewChunk> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(content, embedding)| NewChunk {
            content,
            source: filename.clone(),
            embedding,
            topic: topic.clone(),
            project: project.clone(),
        })
        .collect();

    let chunks_created = store
        .insert_chunks(&records)
        .await
        .map_err(|e| PipelineError::StoreWrite(e.to_string()))?;

    tracing::info!(
        source = %filename,
        chunks = chunks_created,
        topic = topic.as_deref().unwrap_or("-"),
        project = project.as_deref().unwrap_or("-"),
        "document ingested"
    );

    Ok(IngestionOutcome {
        chunks_created,
        topic,
        project,
    })
}

/// Collect supported documents under `folder`, sorted for a deterministic
/// processing order.
pub fn crawl_documents(folder: &Path) -> Vec<std::path::PathBuf> {
    let mut paths: Vec<std::path::PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    paths
}

/// Batch-ingest every supported document under `folder`.
///
/// Each document is its own failure domain: errors are logged and counted,
/// and the run continues with the next file.
pub async fn run_ingest(
    store: &dyn DocumentStore,
    embedder: &dyn EmbeddingProvider,
    folder: &Path,
    size: usize,
    overlap: usize,
) -> anyhow::Result<IngestSummary> {
    if !folder.exists() {
        anyhow::bail!("documents folder not found: {}", folder.display());
    }

    let documents = crawl_documents(folder);
    tracing::info!(folder = %folder.display(), count = documents.len(), "starting ingestion run");

    let mut summary = IngestSummary::default();
    for path in &documents {
        match ingest_document(store, embedder, path, size, overlap, None, None).await {
            Ok(outcome) => {
                summary.documents_ingested += 1;
                summary.chunks_created += outcome.chunks_created;
            }
            Err(e) => {
                summary.documents_failed += 1;
                tracing::warn!(path = %path.display(), error = %e, "skipping document");
            }
        }
    }

    Ok(summary)
}
