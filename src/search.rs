//! Similarity-search orchestration and result assembly.
//!
//! The store returns threshold-filtered candidates sorted by descending
//! similarity; this module converts them into the two shapes the API serves:
//! a flat ranked chunk list and a file-grouped rollup ordered by each file's
//! best score. Assembly is a pure function of the candidate list — no
//! external calls, stable sorts throughout.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

use crate::embedding::{self, EmbeddingProvider};
use crate::error::PipelineError;
use crate::models::SearchCandidate;
use crate::store::DocumentStore;

/// Over-fetch multiplier: the store is asked for this many times the
/// requested count so the rollup still fills up after grouping.
const CANDIDATE_FETCH_FACTOR: usize = 2;

/// One chunk hit, with similarity expressed as a percentage.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub source: String,
    /// Same as `source`; kept for clients that render by file.
    pub file_name: String,
    /// Percentage in [0, 100], rounded to 2 decimal places.
    pub similarity: f64,
    pub topic: Option<String>,
    pub project: Option<String>,
}

/// All hits from one file, ranked by the file's best chunk.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file_name: String,
    pub chunks: Vec<SearchResult>,
    pub best_similarity: f64,
    pub topic: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Flat chunk list in upstream ranking order.
    pub results: Vec<SearchResult>,
    /// Grouped by file, ordered by best similarity.
    pub files: Vec<FileResult>,
    pub query: String,
    pub total_results: usize,
    pub total_files: usize,
}

/// Convert a [0, 1] similarity to a percentage rounded to 2 decimals.
fn percent(similarity: f64) -> f64 {
    (similarity * 100.0 * 100.0).round() / 100.0
}

fn to_result(candidate: &SearchCandidate) -> SearchResult {
    SearchResult {
        id: candidate.id.clone(),
        content: candidate.content.clone(),
        source: candidate.source.clone(),
        file_name: candidate.source.clone(),
        similarity: percent(candidate.similarity),
        topic: candidate.topic.clone(),
        project: candidate.project.clone(),
    }
}

/// Assemble the flat list and the file rollup from upstream candidates.
///
/// Candidates arrive already filtered and ranked; this truncates to
/// `requested_count`, then groups that same set by source. Groups are
/// ordered by best similarity descending and chunks within a group by their
/// own similarity descending; both sorts are stable, so ties keep input
/// order.
pub fn assemble_results(
    query: &str,
    candidates: Vec<SearchCandidate>,
    requested_count: usize,
) -> SearchResponse {
    let mut kept = candidates;
    kept.truncate(requested_count);

    let results: Vec<SearchResult> = kept.iter().map(to_result).collect();

    // Group by source, remembering first-seen order so the later sort is
    // stable with respect to the input.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<SearchResult>> = HashMap::new();
    for result in &results {
        if !groups.contains_key(&result.file_name) {
            order.push(result.file_name.clone());
        }
        groups
            .entry(result.file_name.clone())
            .or_default()
            .push(result.clone());
    }

    let mut files: Vec<FileResult> = order
        .into_iter()
        .map(|file_name| {
            let mut chunks = groups.remove(&file_name).unwrap_or_default();
            chunks.sort_by(|a, b| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let best_similarity = chunks
                .iter()
                .map(|c| c.similarity)
                .fold(f64::NEG_INFINITY, f64::max);
            let topic = chunks.first().and_then(|c| c.topic.clone());
            let project = chunks.first().and_then(|c| c.project.clone());
            FileResult {
                file_name,
                chunks,
                best_similarity,
                topic,
                project,
            }
        })
        .collect();

    files.sort_by(|a, b| {
        b.best_similarity
            .partial_cmp(&a.best_similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    SearchResponse {
        total_results: results.len(),
        total_files: files.len(),
        results,
        files,
        query: query.to_string(),
    }
}

fn invalid_request(message: impl Into<String>) -> anyhow::Error {
    PipelineError::InvalidSearchRequest(message.into()).into()
}

/// Run a semantic search: embed the query, fetch candidates from the store,
/// and assemble the response.
///
/// Request validation happens here, so the CLI and the HTTP server reject
/// the same inputs: the query must be non-blank, the threshold in [0, 1],
/// and the count at least 1.
pub async fn run_search(
    store: &dyn DocumentStore,
    embedder: &dyn EmbeddingProvider,
    query: &str,
    threshold: f64,
    count: usize,
    topic: Option<&str>,
    project: Option<&str>,
) -> Result<SearchResponse> {
    if query.trim().is_empty() {
        return Err(invalid_request("query must not be empty"));
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(invalid_request(format!(
            "threshold must be in [0.0, 1.0], got {}",
            threshold
        )));
    }
    if count < 1 {
        return Err(invalid_request("count must be >= 1"));
    }

    let query_vec = embedding::embed_query(embedder, query).await?;
    let candidates = store
        .similarity_search(
            &query_vec,
            threshold,
            count.saturating_mul(CANDIDATE_FETCH_FACTOR),
            topic,
            project,
        )
        .await?;

    tracing::debug!(
        query,
        candidates = candidates.len(),
        threshold,
        "similarity search complete"
    );

    Ok(assemble_results(query, candidates, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, source: &str, similarity: f64) -> SearchCandidate {
        SearchCandidate {
            id: id.to_string(),
            content: format!("content {}", id),
            source: source.to_string(),
            similarity,
            topic: None,
            project: None,
        }
    }

    #[test]
    fn test_percentage_conversion() {
        let response = assemble_results("q", vec![candidate("c1", "a.txt", 0.8734)], 10);
        assert_eq!(response.results[0].similarity, 87.34);
    }

    #[test]
    fn test_percentage_rounding() {
        let response = assemble_results("q", vec![candidate("c1", "a.txt", 0.87345)], 10);
        assert!((response.results[0].similarity - 87.35).abs() < 1e-9);
    }

    #[test]
    fn test_flat_list_preserves_input_order() {
        let response = assemble_results(
            "q",
            vec![
                candidate("c1", "a.txt", 0.9),
                candidate("c2", "b.txt", 0.8),
                candidate("c3", "a.txt", 0.7),
            ],
            10,
        );
        let ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_truncation_to_requested_count() {
        let candidates: Vec<SearchCandidate> = (0..20)
            .map(|i| candidate(&format!("c{}", i), "a.txt", 1.0 - i as f64 * 0.01))
            .collect();
        let response = assemble_results("q", candidates, 5);
        assert_eq!(response.results.len(), 5);
        let ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn test_groups_ordered_by_best_similarity() {
        // File A best 90%, file B best 95% — B must come first even though
        // A appears first in the input.
        let response = assemble_results(
            "q",
            vec![
                candidate("a1", "a.txt", 0.90),
                candidate("b1", "b.txt", 0.95),
                candidate("a2", "a.txt", 0.60),
                candidate("b2", "b.txt", 0.50),
            ],
            10,
        );
        assert_eq!(response.files[0].file_name, "b.txt");
        assert_eq!(response.files[0].best_similarity, 95.0);
        assert_eq!(response.files[1].file_name, "a.txt");
        assert_eq!(response.files[1].best_similarity, 90.0);
    }

    #[test]
    fn test_chunks_within_group_sorted_descending() {
        let response = assemble_results(
            "q",
            vec![
                candidate("a1", "a.txt", 0.60),
                candidate("a2", "a.txt", 0.90),
                candidate("a3", "a.txt", 0.75),
            ],
            10,
        );
        let sims: Vec<f64> = response.files[0].chunks.iter().map(|c| c.similarity).collect();
        assert_eq!(sims, vec![90.0, 75.0, 60.0]);
    }

    #[test]
    fn test_group_ties_keep_input_order() {
        let response = assemble_results(
            "q",
            vec![
                candidate("a1", "a.txt", 0.80),
                candidate("b1", "b.txt", 0.80),
            ],
            10,
        );
        assert_eq!(response.files[0].file_name, "a.txt");
        assert_eq!(response.files[1].file_name, "b.txt");
    }

    #[test]
    fn test_grouping_uses_truncated_set() {
        // The third candidate falls outside requested_count and must not
        // appear in the rollup either.
        let response = assemble_results(
            "q",
            vec![
                candidate("a1", "a.txt", 0.9),
                candidate("b1", "b.txt", 0.8),
                candidate("c1", "c.txt", 0.7),
            ],
            2,
        );
        assert_eq!(response.total_results, 2);
        assert_eq!(response.total_files, 2);
        assert!(response.files.iter().all(|f| f.file_name != "c.txt"));
    }

    #[test]
    fn test_empty_candidates() {
        let response = assemble_results("q", Vec::new(), 10);
        assert_eq!(response.total_results, 0);
        assert_eq!(response.total_files, 0);
    }

    #[test]
    fn test_deterministic() {
        let make = || {
            vec![
                candidate("a1", "a.txt", 0.91),
                candidate("b1", "b.txt", 0.91),
                candidate("a2", "a.txt", 0.42),
            ]
        };
        let first = assemble_results("q", make(), 10);
        let second = assemble_results("q", make(), 10);
        let names = |r: &SearchResponse| -> Vec<String> {
            r.files.iter().map(|f| f.file_name.clone()).collect()
        };
        assert_eq!(names(&first), names(&second));
    }
}
