use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

mod aggregate;
mod chunker;
mod cli;
mod config;
mod embeddings;
mod errors;
mod sanitize;
mod store;
mod suggest;
mod summarize;
mod web;

use config::Config;
use summarize::{RemoteSummarizer, Summarizer, TruncationSummarizer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    let config = Config::load(Path::new(&args.config))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match args.command {
        cli::Command::EmbedApi {} => {
            let model = embeddings::EmbeddingModel::new(
                &config.embed.model,
                config.embed.model_cache_dir.clone().into(),
            )
            .context("failed to load embedding model")?;
            log::info!(
                "embedding service using {} ({} dimensions)",
                model.name(),
                model.dimensions()
            );

            let state = Arc::new(web::EmbedState {
                encoder: Arc::new(model),
                chunk_size: config.embed.chunk_size,
                chunk_overlap: config.embed.chunk_overlap,
            });

            runtime.block_on(web::serve(web::embed_router(state), &config.embed.bind))
        }

        cli::Command::SimilarApi {} => {
            let database_url = config.resolve_database_url()?;

            runtime.block_on(async {
                let store =
                    store::PgSimilarityStore::connect(&database_url, config.similar.ivfflat_probes)
                        .await
                        .context("failed to connect to the vector store")?;

                let summarizer: Arc<dyn Summarizer> = match &config.similar.summarizer_url {
                    Some(url) => Arc::new(RemoteSummarizer::new(url.clone())?),
                    None => Arc::new(TruncationSummarizer),
                };

                let state = Arc::new(web::SimilarState {
                    store: Arc::new(store),
                    summarizer,
                    distance_limit: config.similar.distance_limit,
                });

                web::serve(web::similar_router(state), &config.similar.bind).await
            })
        }
    }
}
