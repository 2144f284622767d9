use crate::embeddings::EmbeddingError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidConfig { chunk_size: usize, overlap: usize },

    #[error("embedding error: {0:?}")]
    Embedding(#[from] EmbeddingError),
}
