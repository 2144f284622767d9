//! Sliding word-window chunking for embedding input.
//!
//! Documents routinely exceed the embedding model's input limit, so they
//! are split into fixed-size windows of whitespace-delimited words with a
//! small overlap between neighbours, keeping spans near window boundaries
//! intact in at least one chunk.

use crate::errors::AppError;

/// Split `text` into overlapping word windows.
///
/// Window `i` starts at word index `i * (chunk_size - overlap)` and covers
/// up to `chunk_size` words. Words are rejoined with single spaces, so the
/// original inter-word formatting is not preserved.
///
/// Returns `InvalidConfig` when `overlap >= chunk_size` (or `chunk_size`
/// is zero): the stride would be non-positive and window generation would
/// never advance.
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, AppError> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(AppError::InvalidConfig {
            chunk_size,
            overlap,
        });
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let stride = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = usize::min(start + chunk_size, words.len());
        chunks.push(words[start..end].join(" "));
        start += stride;
    }

    Ok(chunks)
}
