//! pgvector-backed lookups of previously indexed chunks.
//!
//! The store owns filtering and ordering: rows come back already below the
//! distance limit and sorted ascending by distance, so downstream grouping
//! never re-sorts individual rows.

use async_trait::async_trait;
use pgvector::Vector;
use tokio_postgres::NoTls;

/// One indexed chunk matched against the query embedding.
#[derive(Debug, Clone)]
pub struct SimilarityRow {
    pub file_name: String,
    pub original_text: String,
    pub distance: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

#[async_trait]
pub trait SimilarityStore: Send + Sync {
    /// Rows with distance below `distance_limit`, ascending by distance.
    async fn nearest_chunks(
        &self,
        embedding: &[f32],
        distance_limit: f64,
    ) -> Result<Vec<SimilarityRow>, StoreError>;
}

const NEAREST_SQL: &str = "SELECT file_name, original_text, embedding <=> $1 AS distance \
     FROM embeddings \
     WHERE embedding <=> $1 < $2 \
     ORDER BY distance ASC";

pub struct PgSimilarityStore {
    client: tokio_postgres::Client,
    ivfflat_probes: u16,
}

impl PgSimilarityStore {
    /// Connect and run a version probe so misconfigured credentials fail
    /// at startup instead of on the first request.
    pub async fn connect(database_url: &str, ivfflat_probes: u16) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                log::error!("postgres connection error: {err}");
            }
        });

        let row = client.query_one("SELECT version()", &[]).await?;
        let version: &str = row.get(0);
        log::info!("connected to {version}");

        Ok(Self {
            client,
            ivfflat_probes,
        })
    }
}

#[async_trait]
impl SimilarityStore for PgSimilarityStore {
    async fn nearest_chunks(
        &self,
        embedding: &[f32],
        distance_limit: f64,
    ) -> Result<Vec<SimilarityRow>, StoreError> {
        // SET does not take bind parameters; probes is a validated u16
        let set_probes = format!("SET ivfflat.probes = {}", self.ivfflat_probes);
        self.client.execute(set_probes.as_str(), &[]).await?;

        let vector = Vector::from(embedding.to_vec());
        let rows = self
            .client
            .query(NEAREST_SQL, &[&vector, &distance_limit])
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(SimilarityRow {
                file_name: row.get("file_name"),
                original_text: row.get("original_text"),
                distance: row.get("distance"),
            });
        }
        Ok(out)
    }
}
