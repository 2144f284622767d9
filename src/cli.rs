use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the yaml config file (created with defaults when missing)
    #[clap(short, long, default_value = "reuseval.yaml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the chunking + embedding HTTP service.
    EmbedApi {},

    /// Start the similarity-search HTTP service.
    SimilarApi {},
}
