use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::search::DEFAULT_LIMIT;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multilingual semantic search over ad templates", long_about = None)]
pub struct Cli {
    /// CSV catalog (template_id,description,category,tags) replacing the built-in templates
    #[arg(short, long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank the catalog against a query
    Search {
        query: String,
        /// Language code of the query, or "auto" to detect it
        #[arg(short, long)]
        language: Option<String>,
        /// Maximum number of results (values below 1 return one result)
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },
    /// Push the catalog to the search index
    Index,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
