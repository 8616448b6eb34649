//! CLI argument parsing for fjord.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// fjord feedback indexing
///
/// Stores feedback responses, keeps the search index in sync with them and
/// runs batch reindexes.
#[derive(Parser, Debug)]
#[command(name = "fjord")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/fjord/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// fjord commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a feedback response and index it
    Add {
        /// Feedback text
        #[arg(short, long)]
        description: String,

        /// Page the feedback is about
        #[arg(short, long, default_value = "")]
        url: String,

        /// Mark the response as happy
        #[arg(long)]
        happy: bool,

        /// Product name
        #[arg(short, long)]
        product: Option<String>,
    },

    /// Delete a response and remove it from the index
    Delete {
        /// Response id
        id: u64,
    },

    /// Reindex every response in chunks
    Reindex {
        /// Entities per chunk (default from config)
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Show batch reindex records
    Status {
        /// Only show records of this batch
        #[arg(short, long)]
        batch_id: Option<String>,
    },

    /// Search indexed responses
    Search {
        /// Query string
        query: String,

        /// Maximum results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Show suggested links for a response
    Suggest {
        /// Response id
        id: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_add() {
        let cli = Cli::parse_from([
            "fjord",
            "add",
            "--description",
            "battery drains fast",
            "--happy",
            "-p",
            "firefox",
        ]);
        match cli.command {
            Commands::Add {
                description,
                url,
                happy,
                product,
            } => {
                assert_eq!(description, "battery drains fast");
                assert_eq!(url, "");
                assert!(happy);
                assert_eq!(product, Some("firefox".to_string()));
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_delete() {
        let cli = Cli::parse_from(["fjord", "delete", "42"]);
        assert!(matches!(cli.command, Commands::Delete { id: 42 }));
    }

    #[test]
    fn test_cli_reindex_with_chunk_size() {
        let cli = Cli::parse_from(["fjord", "reindex", "--chunk-size", "100"]);
        match cli.command {
            Commands::Reindex { chunk_size } => assert_eq!(chunk_size, Some(100)),
            _ => panic!("Expected Reindex command"),
        }
    }

    #[test]
    fn test_cli_status() {
        let cli = Cli::parse_from(["fjord", "status"]);
        assert!(matches!(cli.command, Commands::Status { batch_id: None }));
    }

    #[test]
    fn test_cli_search_defaults() {
        let cli = Cli::parse_from(["fjord", "search", "battery"]);
        match cli.command {
            Commands::Search { query, limit } => {
                assert_eq!(query, "battery");
                assert_eq!(limit, 10);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "fjord",
            "suggest",
            "7",
            "--config",
            "/path/to/config.toml",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Suggest { id: 7 }));
    }
}
