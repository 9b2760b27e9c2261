use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use vecload::cli::commands::{handle_collection, handle_config, handle_ingest, handle_status};
use vecload::cli::{Cli, Commands};
use vecload::models::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    let format = cli.format.unwrap_or(config.output.default_format);
    let verbose = cli.verbose;

    // In-flight batches observe the token instead of being dropped mid-call
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        eprintln!("\nReceived shutdown signal, stopping dispatch...");
        signal_cancel.cancel();
        shutdown_signal().await;
        eprintln!("Forced exit.");
        std::process::exit(130);
    });

    run_command(cli.command, format, verbose, cancel).await?;

    Ok(())
}

async fn run_command(
    command: Commands,
    format: vecload::models::OutputFormat,
    verbose: bool,
    cancel: CancellationToken,
) -> Result<()> {
    match command {
        Commands::Ingest(args) => {
            handle_ingest(args, format, verbose, cancel).await?;
        }
        Commands::Collection(cmd) => {
            handle_collection(cmd, format, verbose).await?;
        }
        Commands::Status => {
            handle_status(format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
