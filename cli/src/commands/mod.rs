pub mod ask;
pub mod build;
pub mod retrieve;
pub mod ui;
pub mod utils;
pub mod verify;
pub mod web;

pub use ask::handle_ask;
pub use build::handle_build;
pub use retrieve::handle_retrieve;
pub use verify::handle_verify;
pub use web::handle_web;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "defraud")]
#[command(about = "check news claims against an indexed corpus and the live web")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the vector index from a labeled CSV dataset
    Build {
        /// CSV file with title, text/body and label columns
        #[arg(long)]
        dataset: PathBuf,

        /// Index directory (overrides index.dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Index file prefix (overrides index.index_name)
        #[arg(long)]
        index_name: Option<String>,
    },
    /// Verify a claim with the agent (corpus QA plus web search)
    Ask {
        /// The claim to check
        claim: String,
        /// Show thoughts, tool calls and observations
        #[arg(long, default_value_t = false)]
        verbose: bool,
        /// Print the response as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Load the index without checksum verification
        #[arg(long, default_value_t = false)]
        trust_index: bool,
    },
    /// Verify a claim against the corpus only
    Verify {
        /// The claim to check
        claim: String,
        /// Print the response as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Load the index without checksum verification
        #[arg(long, default_value_t = false)]
        trust_index: bool,
    },
    /// Show the raw ranked chunks for a query
    Retrieve {
        /// The query string
        query: String,
        /// Number of results (defaults to retrieval.k)
        #[arg(long)]
        top: Option<usize>,
        /// Load the index without checksum verification
        #[arg(long, default_value_t = false)]
        trust_index: bool,
    },
    /// Search the live web
    Web {
        /// The query string
        query: String,
        /// Number of results (defaults to search.max_results)
        #[arg(long)]
        top: Option<usize>,
    },
}
