use anyhow::Result;
use console::style;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::create_backend;

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (connected, collection_info) = match create_backend(&config.store) {
        Ok(store) => {
            let connected = store.health_check().await.unwrap_or(false);
            let info = if connected {
                store
                    .collection_info(&config.store.collection)
                    .await
                    .ok()
                    .flatten()
            } else {
                None
            };
            (connected, info)
        }
        Err(_) => (false, None),
    };

    let status = StatusInfo {
        store_url: config.store.url.clone(),
        store_connected: connected,
        collection: config.store.collection.clone(),
        collection_exists: collection_info.is_some(),
        points_count: collection_info.map_or(0, |i| i.points_count),
    };

    print!("{}", formatter.format_status(&status));

    if !connected {
        eprintln!();
        eprintln!(
            "{}",
            style("Warning: Qdrant not reachable. Start with: docker run -p 6334:6334 qdrant/qdrant")
                .yellow()
        );
    }

    Ok(())
}
