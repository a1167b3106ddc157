//! End-to-end pipeline tests: ingest real files from a temp directory into
//! the in-memory store with a deterministic fake embedder, then search.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use synapse::embedding::EmbeddingProvider;
use synapse::error::PipelineError;
use synapse::ingest::{ingest_document, run_ingest};
use synapse::models::NewChunk;
use synapse::search::run_search;
use synapse::store::{DocumentStore, MemoryStore};

/// Deterministic embedder: each text maps to a fixed 4-dim vector derived
/// from its byte sum, and every batch call is counted.
struct FakeEmbedder {
    calls: AtomicUsize,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn model_name(&self) -> &str {
        "fake"
    }

    fn dims(&self) -> usize {
        4
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let sum: u32 = t.bytes().map(u32::from).sum();
                let x = (sum % 97) as f32 / 97.0;
                vec![x, 1.0 - x, 0.5, 0.25]
            })
            .collect())
    }
}

/// Embedder that always fails, for exercising the error path.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn dims(&self) -> usize {
        4
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("embedding backend unavailable")
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_ingest_chunks_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let text = "a".repeat(1200);
    let path = write_file(dir.path(), "long.txt", &text);

    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();

    let outcome = ingest_document(&store, &embedder, &path, 500, 100, None, None)
        .await
        .unwrap();

    assert_eq!(outcome.chunks_created, 3);
    assert_eq!(store.len(), 3);
    // One batched embedding call for the whole document.
    assert_eq!(embedder.call_count(), 1);
}

#[tokio::test]
async fn test_ingest_window_lengths() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "windows.txt", &"x".repeat(1200));

    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    ingest_document(&store, &embedder, &path, 500, 100, None, None)
        .await
        .unwrap();

    let hits = store
        .similarity_search(&[0.0, 0.0, 0.0, 0.0], -1.0, 10, None, None)
        .await
        .unwrap();
    let mut lengths: Vec<usize> = hits.iter().map(|h| h.content.chars().count()).collect();
    lengths.sort_by(|a, b| b.cmp(a));
    assert_eq!(lengths, vec![500, 500, 400]);
}

#[tokio::test]
async fn test_ingest_classifies_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "q3_results.txt",
        "This report summarizes quarterly analysis and performance metrics for Project X.",
    );

    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    let outcome = ingest_document(&store, &embedder, &path, 500, 100, None, None)
        .await
        .unwrap();

    assert_eq!(outcome.topic.as_deref(), Some("Report"));
    assert_eq!(outcome.project.as_deref(), Some("Project X"));
}

#[tokio::test]
async fn test_ingest_explicit_metadata_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "report.txt",
        "quarterly report analysis from the team meeting",
    );

    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    let outcome = ingest_document(
        &store,
        &embedder,
        &path,
        500,
        100,
        Some("Strategy".to_string()),
        None,
    )
    .await
    .unwrap();

    // The caller's topic overrides the classifier; the project still comes
    // from classification.
    assert_eq!(outcome.topic.as_deref(), Some("Strategy"));
    assert_eq!(outcome.project.as_deref(), Some("Internal"));
}

#[tokio::test]
async fn test_ingest_rejects_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "blank.txt", "   \n\t  ");

    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    let err = ingest_document(&store, &embedder, &path, 500, 100, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoExtractableText(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_embedding_failure_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "doc.txt", "some marketing copy");

    let store = MemoryStore::new();
    let err = ingest_document(&store, &FailingEmbedder, &path, 500, 100, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Embedding(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_store_write_failure_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "doc.txt", "some marketing copy");

    let store = MemoryStore::new();
    store.fail_next_insert();
    let embedder = FakeEmbedder::new();

    let err = ingest_document(&store, &embedder, &path, 500, 100, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::StoreWrite(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_sync_continues_past_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "good.txt", "campaign strategy roadmap");
    write_file(dir.path(), "note.md", "# Social media calendar");
    // A .docx that is not a zip archive fails extraction.
    write_file(dir.path(), "bad.docx", "this is not a zip archive");

    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    let summary = run_ingest(&store, &embedder, dir.path(), 500, 100)
        .await
        .unwrap();

    assert_eq!(summary.documents_ingested, 2);
    assert_eq!(summary.documents_failed, 1);
    assert_eq!(summary.chunks_created, 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_sync_missing_folder_errors() {
    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    let result = run_ingest(
        &store,
        &embedder,
        Path::new("/nonexistent/folder/for/tests"),
        500,
        100,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_search_groups_and_truncates() {
    let store = MemoryStore::new();

    // Two files with known vectors: brief.txt holds the best and worst
    // chunks, plan.txt sits in between.
    store
        .insert_chunks(&[
            NewChunk {
                content: "exact match".to_string(),
                source: "brief.txt".to_string(),
                embedding: vec![1.0, 0.0],
                topic: Some("Brief".to_string()),
                project: None,
            },
            NewChunk {
                content: "close match".to_string(),
                source: "plan.txt".to_string(),
                embedding: vec![0.9, 0.1],
                topic: Some("Strategy".to_string()),
                project: None,
            },
            NewChunk {
                content: "weak match".to_string(),
                source: "brief.txt".to_string(),
                embedding: vec![0.6, 0.8],
                topic: Some("Brief".to_string()),
                project: None,
            },
        ])
        .await
        .unwrap();

    struct UnitEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnitEmbedder {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    let response = run_search(&store, &UnitEmbedder, "launch plan", 0.5, 10, None, None)
        .await
        .unwrap();

    assert_eq!(response.total_results, 3);
    assert_eq!(response.total_files, 2);
    // brief.txt owns the single best chunk, so it leads the rollup even
    // though its other chunk scores lowest.
    assert_eq!(response.files[0].file_name, "brief.txt");
    assert_eq!(response.files[0].chunks.len(), 2);
    assert!(response.files[0].best_similarity > response.files[1].best_similarity);
    // Flat results keep descending order and percentage scale.
    assert!((response.results[0].similarity - 100.0).abs() < 0.01);
    assert!(response.results[0].similarity >= response.results[1].similarity);

    // A tight count truncates both views.
    let top_one = run_search(&store, &UnitEmbedder, "launch plan", 0.5, 1, None, None)
        .await
        .unwrap();
    assert_eq!(top_one.total_results, 1);
    assert_eq!(top_one.total_files, 1);
    assert_eq!(top_one.results[0].content, "exact match");
}

#[tokio::test]
async fn test_search_topic_filter() {
    let store = MemoryStore::new();
    store
        .insert_chunks(&[
            NewChunk {
                content: "strategy chunk".to_string(),
                source: "a.txt".to_string(),
                embedding: vec![1.0, 0.0],
                topic: Some("Strategy".to_string()),
                project: None,
            },
            NewChunk {
                content: "report chunk".to_string(),
                source: "b.txt".to_string(),
                embedding: vec![1.0, 0.0],
                topic: Some("Report".to_string()),
                project: None,
            },
        ])
        .await
        .unwrap();

    struct UnitEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnitEmbedder {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    let response = run_search(
        &store,
        &UnitEmbedder,
        "query",
        0.0,
        10,
        Some("Report"),
        None,
    )
    .await
    .unwrap();

    assert_eq!(response.total_results, 1);
    assert_eq!(response.results[0].content, "report chunk");
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    let err = run_search(&store, &embedder, "   ", 0.5, 10, None, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("must not be empty"));
    let pipeline = err.downcast_ref::<PipelineError>().unwrap();
    assert!(pipeline.is_client_error());
}

#[tokio::test]
async fn test_search_rejects_out_of_range_threshold() {
    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    for threshold in [-0.1, 1.5] {
        let err = run_search(&store, &embedder, "query", threshold, 10, None, None)
            .await
            .unwrap_err();
        let pipeline = err.downcast_ref::<PipelineError>().unwrap();
        assert!(
            matches!(pipeline, PipelineError::InvalidSearchRequest(_)),
            "{threshold}"
        );
    }
}

#[tokio::test]
async fn test_search_rejects_zero_count() {
    let store = MemoryStore::new();
    let embedder = FakeEmbedder::new();
    let err = run_search(&store, &embedder, "query", 0.5, 0, None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>().unwrap(),
        PipelineError::InvalidSearchRequest(_)
    ));
}

#[tokio::test]
async fn test_search_huge_count_does_not_overflow() {
    let store = MemoryStore::new();
    store
        .insert_chunks(&[NewChunk {
            content: "only chunk".to_string(),
            source: "a.txt".to_string(),
            embedding: vec![1.0, 0.0, 0.0, 0.0],
            topic: None,
            project: None,
        }])
        .await
        .unwrap();

    struct UnitEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnitEmbedder {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
        }
    }

    // The over-fetch factor must not wrap for extreme counts.
    let response = run_search(&store, &UnitEmbedder, "q", 0.5, usize::MAX, None, None)
        .await
        .unwrap();
    assert_eq!(response.total_results, 1);
}
