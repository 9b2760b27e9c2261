//! CLI module for the vector loader.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Concurrent batch loader for Qdrant vector collections.
#[derive(Debug, Parser)]
#[command(name = "vecload")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load vector records into a collection
    Ingest(commands::IngestArgs),

    /// Manage collections (create, drop, info)
    #[command(subcommand)]
    Collection(commands::CollectionCommand),

    /// Check vector store status
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
