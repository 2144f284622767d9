use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::signal;

use crate::{
    aggregate::{aggregate, ProjectGroup},
    chunker::chunk_words,
    embeddings::TextEncoder,
    errors::AppError,
    store::SimilarityStore,
    summarize::Summarizer,
};

/// File name used when the caller does not provide one.
const DEFAULT_FILE_NAME: &str = "arquivo_sem_nome.txt";

/// Shared state of the embedding service.
pub struct EmbedState {
    pub encoder: Arc<dyn TextEncoder>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Shared state of the similarity-search service.
pub struct SimilarState {
    pub store: Arc<dyn SimilarityStore>,
    pub summarizer: Arc<dyn Summarizer>,
    pub distance_limit: f64,
}

// Wraps `AppError` so axum knows how to render it.
#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            AppError::InvalidInput(_) => (
                axum::http::StatusCode::BAD_REQUEST,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            AppError::InvalidConfig { .. } => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.0.to_string()}).to_string(),
                )
            }
            AppError::Embedding(_) => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "embedding generation failed"}).to_string(),
                )
            }
        }
        .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Deserialize)]
struct EmbedRequest {
    #[serde(default)]
    file_name: Option<String>,

    #[serde(default)]
    file_data: String,
}

#[derive(Debug, Serialize)]
struct EmbedResponse {
    file_name: String,
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

async fn embed(
    State(state): State<Arc<EmbedState>>,
    Json(payload): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, HttpError> {
    log::debug!(
        "embed request: file_name={:?}, {} bytes of text",
        payload.file_name,
        payload.file_data.len()
    );

    if payload.file_data.trim().is_empty() {
        return Err(HttpError(AppError::InvalidInput(
            "file_data must not be empty".to_string(),
        )));
    }

    let file_name = payload
        .file_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

    let chunks = chunk_words(&payload.file_data, state.chunk_size, state.chunk_overlap)?;

    let encoder = state.encoder.clone();
    let embeddings = {
        let chunks = chunks.clone();
        tokio::task::block_in_place(move || encoder.encode(&chunks))?
    };

    Ok(Json(EmbedResponse {
        file_name,
        chunks,
        embeddings,
    }))
}

#[derive(Debug, Serialize)]
struct SimilarResponse {
    #[serde(rename = "nome_projeto_consultado")]
    queried_project: String,
    #[serde(rename = "projetos_similares")]
    similar_projects: Vec<ProjectGroup>,
}

// Takes a raw JSON value so field problems surface as a 400 with the
// documented error body instead of a framework rejection.
async fn avalsimilar(
    State(state): State<Arc<SimilarState>>,
    Json(payload): Json<Value>,
) -> Result<Json<SimilarResponse>, HttpError> {
    let nome_arquivo = payload
        .get("nome_arquivo")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty());
    let embedding = payload.get("embedding").and_then(Value::as_array);

    let (Some(nome_arquivo), Some(embedding)) = (nome_arquivo, embedding) else {
        return Err(HttpError(AppError::InvalidInput(
            "campos 'nome_arquivo' e 'embedding' são obrigatórios".to_string(),
        )));
    };

    let mut query_vector = Vec::with_capacity(embedding.len());
    for entry in embedding {
        match entry.as_f64() {
            Some(value) => query_vector.push(value as f32),
            None => {
                return Err(HttpError(AppError::InvalidInput(
                    "campo 'embedding' deve conter apenas números".to_string(),
                )))
            }
        }
    }

    log::debug!(
        "avalsimilar request: nome_arquivo={nome_arquivo}, {} dimensions",
        query_vector.len()
    );

    // Degrade to an empty result on store failure; the caller still gets a
    // well-formed 200 response.
    let similar_projects = match state
        .store
        .nearest_chunks(&query_vector, state.distance_limit)
        .await
    {
        Ok(rows) => aggregate(rows, state.summarizer.as_ref()).await,
        Err(err) => {
            log::error!("similarity lookup failed: {err}");
            Vec::new()
        }
    };

    Ok(Json(SimilarResponse {
        queried_project: nome_arquivo.to_string(),
        similar_projects,
    }))
}

pub fn embed_router(state: Arc<EmbedState>) -> Router {
    Router::new()
        .route("/embed", post(embed))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

pub fn similar_router(state: Arc<SimilarState>) -> Router {
    Router::new()
        .route("/avalsimilar", post(avalsimilar))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub async fn serve(app: Router, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("listening on {bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
