//! Collection command implementation.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;

use crate::cli::output::{CollectionStats, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::create_backend;

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    /// Create a collection if it doesn't exist
    Create {
        /// Collection name (defaults to the configured collection)
        name: Option<String>,

        /// Vector dimension for the new collection
        #[arg(long, short = 'd')]
        dimension: Option<u64>,

        /// Drop an existing collection first
        #[arg(long)]
        recreate: bool,
    },

    /// Drop a collection
    Drop {
        /// Collection name (defaults to the configured collection)
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        force: bool,
    },

    /// Show collection information
    Info {
        /// Collection name (defaults to the configured collection)
        name: Option<String>,
    },
}

pub async fn handle_collection(
    cmd: CollectionCommand,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match cmd {
        CollectionCommand::Create {
            name,
            dimension,
            recreate,
        } => handle_create(name, dimension, recreate, format, verbose).await,
        CollectionCommand::Drop { name, force } => handle_drop(name, force, format).await,
        CollectionCommand::Info { name } => handle_info(name, format).await,
    }
}

async fn handle_create(
    name: Option<String>,
    dimension: Option<u64>,
    recreate: bool,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let name = name.unwrap_or_else(|| config.store.collection.clone());
    let dimension = dimension.unwrap_or(config.store.dimension);

    let store = create_backend(&config.store)?;

    if recreate {
        store
            .delete_collection(&name)
            .await
            .context("failed to drop existing collection")?;
        if verbose {
            println!("Dropped collection '{}'", name);
        }
    }

    store
        .create_collection(&name, dimension)
        .await
        .context("failed to create collection")?;

    println!(
        "{}",
        formatter.format_message(&format!(
            "Collection '{}' ready ({}-dimensional)",
            name, dimension
        ))
    );

    Ok(())
}

async fn handle_drop(name: Option<String>, force: bool, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let name = name.unwrap_or_else(|| config.store.collection.clone());

    if !force {
        println!(
            "{} Continue? [y/N]",
            style(format!("This will delete collection '{}' and all its points.", name)).yellow()
        );
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.format_message("Cancelled."));
            return Ok(());
        }
    }

    let store = create_backend(&config.store)?;
    store
        .delete_collection(&name)
        .await
        .context("failed to drop collection")?;

    println!(
        "{}",
        formatter.format_message(&format!("Collection '{}' dropped", name))
    );

    Ok(())
}

async fn handle_info(name: Option<String>, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let name = name.unwrap_or_else(|| config.store.collection.clone());

    let store = create_backend(&config.store)?;
    let info = store.collection_info(&name).await?;

    let stats = CollectionStats {
        name,
        exists: info.is_some(),
        points_count: info.map_or(0, |i| i.points_count),
    };

    print!("{}", formatter.format_collection(&stats));

    Ok(())
}
