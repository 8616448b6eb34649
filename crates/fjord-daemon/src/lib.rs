//! fjord command line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `app`: Opens stores and wires the indexing pipeline
//! - `commands`: Command implementations

pub mod app;
pub mod cli;
pub mod commands;

pub use app::App;
pub use cli::{Cli, Commands};
pub use commands::{
    add_response, delete_response, init_logging, load_settings, reindex, search, show_status,
    suggest,
};
