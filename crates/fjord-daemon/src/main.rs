//! fjord
//!
//! Feedback storage with live and batch search indexing.
//!
//! # Usage
//!
//! ```bash
//! fjord add --description "battery drains fast" [--url URL] [--happy]
//! fjord delete <ID>
//! fjord reindex [--chunk-size N]
//! fjord status [--batch-id ID]
//! fjord search <QUERY> [--limit N]
//! fjord suggest <ID>
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/fjord/config.toml)
//! 3. Environment variables (FJORD_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use fjord_daemon::{
    add_response, delete_response, init_logging, load_settings, reindex, search, show_status,
    suggest, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.db_path.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Add {
            description,
            url,
            happy,
            product,
        } => {
            add_response(&settings, &description, &url, happy, product.as_deref()).await?;
        }
        Commands::Delete { id } => {
            delete_response(&settings, id).await?;
        }
        Commands::Reindex { chunk_size } => {
            reindex(&settings, chunk_size).await?;
        }
        Commands::Status { batch_id } => {
            show_status(&settings, batch_id.as_deref())?;
        }
        Commands::Search { query, limit } => {
            search(&settings, &query, limit)?;
        }
        Commands::Suggest { id } => {
            suggest(&settings, id).await?;
        }
    }

    Ok(())
}
