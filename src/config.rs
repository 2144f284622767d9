use std::path::Path;

use serde::{Deserialize, Serialize};

const DEFAULT_EMBED_BIND: &str = "0.0.0.0:5000";
const DEFAULT_SIMILAR_BIND: &str = "0.0.0.0:5001";

/// Default embedding model; multilingual because indexed projects are not
/// English-only.
const DEFAULT_MODEL: &str = "multilingual-e5-small";
const DEFAULT_MODEL_CACHE_DIR: &str = ".reuseval";

const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_CHUNK_OVERLAP: usize = 50;

const DEFAULT_DISTANCE_LIMIT: f64 = 0.5;
const DEFAULT_IVFFLAT_PROBES: u16 = 10;

/// Configuration for the chunking + embedding service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbedConfig {
    #[serde(default = "default_embed_bind")]
    pub bind: String,

    /// Embedding model name (e.g. "multilingual-e5-small")
    #[serde(default = "default_model")]
    pub model: String,

    /// Directory for downloaded model files
    #[serde(default = "default_model_cache_dir")]
    pub model_cache_dir: String,

    /// Words per chunk window
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Words shared between adjacent windows
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_EMBED_BIND.to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_cache_dir: DEFAULT_MODEL_CACHE_DIR.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Configuration for the similarity-search service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimilarConfig {
    #[serde(default = "default_similar_bind")]
    pub bind: String,

    /// Postgres connection string; the DATABASE_URL environment variable
    /// takes precedence so credentials stay out of the config file.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Rows at or beyond this cosine distance are never returned
    #[serde(default = "default_distance_limit")]
    pub distance_limit: f64,

    /// ivfflat index partitions scanned per query
    #[serde(default = "default_ivfflat_probes")]
    pub ivfflat_probes: u16,

    /// Summarization endpoint; unset means local truncation summaries
    #[serde(default)]
    pub summarizer_url: Option<String>,
}

impl Default for SimilarConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_SIMILAR_BIND.to_string(),
            database_url: None,
            distance_limit: DEFAULT_DISTANCE_LIMIT,
            ivfflat_probes: DEFAULT_IVFFLAT_PROBES,
            summarizer_url: None,
        }
    }
}

fn default_embed_bind() -> String {
    DEFAULT_EMBED_BIND.to_string()
}

fn default_similar_bind() -> String {
    DEFAULT_SIMILAR_BIND.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_model_cache_dir() -> String {
    DEFAULT_MODEL_CACHE_DIR.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_distance_limit() -> f64 {
    DEFAULT_DISTANCE_LIMIT
}

fn default_ivfflat_probes() -> u16 {
    DEFAULT_IVFFLAT_PROBES
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embed: EmbedConfig,

    #[serde(default)]
    pub similar: SimilarConfig,
}

impl Config {
    /// Load the config file, creating it with defaults when missing.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            std::fs::write(path, serde_yml::to_string(&config)?)?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.embed.chunk_size > 0,
            "embed.chunk_size must be greater than 0"
        );
        anyhow::ensure!(
            self.embed.chunk_overlap < self.embed.chunk_size,
            "embed.chunk_overlap ({}) must be smaller than embed.chunk_size ({})",
            self.embed.chunk_overlap,
            self.embed.chunk_size
        );
        anyhow::ensure!(
            self.similar.distance_limit > 0.0,
            "similar.distance_limit must be greater than 0"
        );
        anyhow::ensure!(
            self.similar.ivfflat_probes > 0,
            "similar.ivfflat_probes must be greater than 0"
        );
        Ok(())
    }

    /// Connection string for the vector store. The environment wins over
    /// the config file.
    pub fn resolve_database_url(&self) -> anyhow::Result<String> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                return Ok(url);
            }
        }
        self.similar
            .database_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("set DATABASE_URL or similar.database_url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuseval.yaml");

        let config = Config::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.embed.chunk_size, 500);
        assert_eq!(config.embed.chunk_overlap, 50);
        assert_eq!(config.similar.distance_limit, 0.5);
        assert_eq!(config.similar.ivfflat_probes, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuseval.yaml");
        std::fs::write(&path, "embed:\n  chunk_size: 200\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.embed.chunk_size, 200);
        assert_eq!(config.embed.chunk_overlap, 50);
        assert_eq!(config.similar.bind, "0.0.0.0:5001");
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuseval.yaml");
        std::fs::write(&path, "embed:\n  chunk_size: 50\n  chunk_overlap: 50\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_rejects_zero_probes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuseval.yaml");
        std::fs::write(&path, "similar:\n  ivfflat_probes: 0\n").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
