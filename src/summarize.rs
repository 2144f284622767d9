//! Summarization collaborator boundary.
//!
//! The abstractive model itself lives outside this process. `Summarizer`
//! is the seam: the similarity service talks to a remote summarization
//! endpoint when one is configured and otherwise falls back to plain
//! truncation, which is also the per-chunk recovery path when a remote
//! call fails.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default summary length bounds passed to the model.
pub const DEFAULT_MAX_LENGTH: usize = 130;
pub const DEFAULT_MIN_LENGTH: usize = 30;

/// Characters kept by the truncation fallback.
const FALLBACK_SUMMARY_CHARS: usize = 300;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("summarization request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("summarization endpoint returned an empty summary")]
    EmptySummary,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, SummarizeError>;
}

/// First 300 characters plus an ellipsis marker.
pub fn truncate_summary(text: &str) -> String {
    let head: String = text.chars().take(FALLBACK_SUMMARY_CHARS).collect();
    format!("{head}...")
}

/// Degenerate summarizer used when no endpoint is configured.
pub struct TruncationSummarizer;

#[async_trait]
impl Summarizer for TruncationSummarizer {
    async fn summarize(
        &self,
        text: &str,
        _max_length: usize,
        _min_length: usize,
    ) -> Result<String, SummarizeError> {
        Ok(truncate_summary(text))
    }
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    max_length: usize,
    min_length: usize,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary_text: String,
}

/// Client for an HTTP summarization endpoint.
///
/// Posts `{text, max_length, min_length}` and expects `{summary_text}`.
pub struct RemoteSummarizer {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteSummarizer {
    pub fn new(endpoint: String) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Summarizer for RemoteSummarizer {
    async fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, SummarizeError> {
        let request = SummarizeRequest {
            text,
            max_length,
            min_length,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: SummarizeResponse = response.json().await?;
        if body.summary_text.trim().is_empty() {
            return Err(SummarizeError::EmptySummary);
        }
        Ok(body.summary_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_still_gets_marker() {
        assert_eq!(truncate_summary("short"), "short...");
    }

    #[test]
    fn test_truncate_caps_at_300_chars() {
        let long = "x".repeat(500);
        let summary = truncate_summary(&long);
        assert_eq!(summary.chars().count(), 303);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let long = "é".repeat(400);
        let summary = truncate_summary(&long);
        assert_eq!(summary.chars().count(), 303);
    }

    #[tokio::test]
    async fn test_truncation_summarizer_ignores_length_bounds() {
        let summarizer = TruncationSummarizer;
        let out = summarizer.summarize("some text", 130, 30).await.unwrap();
        assert_eq!(out, "some text...");
    }
}
