//! Groups distance-ranked rows by source file and derives reuse statistics.
//!
//! Input rows arrive from the store already filtered and sorted ascending
//! by distance. Grouping preserves that per-file order, so the "relevant
//! chunks" of a group are its closest matches.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::sanitize::sanitize_bytes;
use crate::store::SimilarityRow;
use crate::suggest::suggest_reuse;
use crate::summarize::{truncate_summary, Summarizer, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH};

/// How many chunks a group exposes in its response view.
const RELEVANT_CHUNKS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct SummarizedChunk {
    #[serde(rename = "trecho_resumido")]
    pub summary: String,
    #[serde(rename = "distancia")]
    pub distance: f64,
}

/// All matched chunks of one source file plus summary statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectGroup {
    #[serde(rename = "projeto_similar")]
    pub file_name: String,
    #[serde(rename = "quantidade_chunks_similares")]
    pub count: usize,
    #[serde(rename = "media_distancia")]
    pub mean_distance: f64,
    #[serde(rename = "menor_distancia")]
    pub min_distance: f64,
    #[serde(rename = "trechos_relevantes")]
    pub relevant_chunks: Vec<SummarizedChunk>,
    #[serde(rename = "sugestao_reuso")]
    pub suggestion: String,
}

/// Build project groups from ranked rows.
///
/// Each row is sanitized, summarized, and appended to the group for its
/// file. A summarization failure downgrades that one chunk to a truncated
/// raw-text summary and processing continues. Groups come back sorted
/// ascending by mean distance; ties keep first-seen order (stable sort).
pub async fn aggregate(
    rows: Vec<SimilarityRow>,
    summarizer: &dyn Summarizer,
) -> Vec<ProjectGroup> {
    let mut file_order: Vec<String> = Vec::new();
    let mut chunks_by_file: HashMap<String, Vec<SummarizedChunk>> = HashMap::new();

    for row in rows {
        let clean = sanitize_bytes(row.original_text.as_bytes());
        let summary = match summarizer
            .summarize(&clean, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH)
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                log::warn!("summarization failed for a chunk of {}: {err}", row.file_name);
                truncate_summary(&clean)
            }
        };

        if !chunks_by_file.contains_key(&row.file_name) {
            file_order.push(row.file_name.clone());
        }
        chunks_by_file
            .entry(row.file_name)
            .or_default()
            .push(SummarizedChunk {
                summary,
                distance: row.distance,
            });
    }

    let mut groups: Vec<ProjectGroup> = file_order
        .into_iter()
        .filter_map(|file_name| {
            chunks_by_file
                .remove(&file_name)
                .map(|chunks| build_group(file_name, chunks))
        })
        .collect();

    groups.sort_by(|a, b| {
        a.mean_distance
            .partial_cmp(&b.mean_distance)
            .unwrap_or(Ordering::Equal)
    });
    groups
}

fn build_group(file_name: String, chunks: Vec<SummarizedChunk>) -> ProjectGroup {
    let distances: Vec<f64> = chunks.iter().map(|c| c.distance).collect();
    let count = chunks.len();
    let mean = distances.iter().sum::<f64>() / count as f64;
    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let suggestion = suggest_reuse(&file_name, &distances);

    let mut relevant_chunks = chunks;
    relevant_chunks.truncate(RELEVANT_CHUNKS);

    ProjectGroup {
        file_name,
        count,
        mean_distance: round4(mean),
        min_distance: round4(min),
        relevant_chunks,
        suggestion,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::SummarizeError;
    use async_trait::async_trait;

    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(
            &self,
            text: &str,
            _max_length: usize,
            _min_length: usize,
        ) -> Result<String, SummarizeError> {
            Ok(text.to_string())
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(
            &self,
            _text: &str,
            _max_length: usize,
            _min_length: usize,
        ) -> Result<String, SummarizeError> {
            Err(SummarizeError::EmptySummary)
        }
    }

    fn row(file_name: &str, text: &str, distance: f64) -> SimilarityRow {
        SimilarityRow {
            file_name: file_name.to_string(),
            original_text: text.to_string(),
            distance,
        }
    }

    #[tokio::test]
    async fn test_groups_by_file_with_stats() {
        let rows = vec![
            row("a", "first of a", 0.1),
            row("b", "only b", 0.2),
            row("a", "second of a", 0.15),
        ];
        let groups = aggregate(rows, &EchoSummarizer).await;

        assert_eq!(groups.len(), 2);

        // "a" has the lower mean, so it comes first
        assert_eq!(groups[0].file_name, "a");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].mean_distance, 0.125);
        assert_eq!(groups[0].min_distance, 0.1);

        assert_eq!(groups[1].file_name, "b");
        assert_eq!(groups[1].count, 1);
        assert_eq!(groups[1].mean_distance, 0.2);
    }

    #[tokio::test]
    async fn test_relevant_chunks_are_first_three_in_input_order() {
        let rows: Vec<SimilarityRow> = (0..5)
            .map(|i| row("proj", &format!("chunk {i}"), 0.1 + 0.05 * i as f64))
            .collect();
        let groups = aggregate(rows, &EchoSummarizer).await;

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 5);
        assert_eq!(groups[0].relevant_chunks.len(), 3);
        let summaries: Vec<&str> = groups[0]
            .relevant_chunks
            .iter()
            .map(|c| c.summary.as_str())
            .collect();
        assert_eq!(summaries, vec!["chunk 0", "chunk 1", "chunk 2"]);
    }

    #[tokio::test]
    async fn test_mean_is_rounded_to_four_places() {
        let rows = vec![
            row("a", "x", 0.1),
            row("a", "y", 0.2),
            row("a", "z", 0.1),
        ];
        let groups = aggregate(rows, &EchoSummarizer).await;
        // 0.4 / 3 = 0.13333...
        assert_eq!(groups[0].mean_distance, 0.1333);
    }

    #[tokio::test]
    async fn test_summarizer_failure_falls_back_to_truncation() {
        let rows = vec![row("a", &"x".repeat(400), 0.1)];
        let groups = aggregate(rows, &FailingSummarizer).await;

        let summary = &groups[0].relevant_chunks[0].summary;
        assert_eq!(summary.chars().count(), 303);
        assert!(summary.ends_with("..."));
    }

    #[tokio::test]
    async fn test_chunk_text_is_sanitized_before_summarization() {
        let rows = vec![row("a", "bad\0 \u{fb01}le", 0.1)];
        let groups = aggregate(rows, &EchoSummarizer).await;
        assert_eq!(groups[0].relevant_chunks[0].summary, "bad file");
    }

    #[tokio::test]
    async fn test_empty_input_yields_no_groups() {
        let groups = aggregate(Vec::new(), &EchoSummarizer).await;
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_equal_means_keep_first_seen_order() {
        let rows = vec![
            row("first", "x", 0.4),
            row("second", "y", 0.4),
        ];
        let groups = aggregate(rows, &EchoSummarizer).await;
        assert_eq!(groups[0].file_name, "first");
        assert_eq!(groups[1].file_name, "second");
    }

    #[tokio::test]
    async fn test_suggestion_reflects_group_distances() {
        let rows = vec![row("close", "x", 0.05), row("far", "y", 0.45)];
        let groups = aggregate(rows, &EchoSummarizer).await;
        assert!(groups[0].suggestion.contains("alta similaridade"));
        assert!(groups[1].suggestion.contains("similaridade moderada"));
    }
}
