//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cli::output::{FailureLine, IngestStats, get_formatter};
use crate::models::{Config, OutputFormat, parse_records, validate_records};
use crate::services::{IngestPipeline, VectorStore, create_backend, split_into_batches};

/// Arguments for the ingest command.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Path to JSON or JSONL records file (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    /// Target collection (defaults to the configured collection)
    #[arg(long, short = 'c')]
    pub collection: Option<String>,

    /// Records per upsert call
    #[arg(long, short = 'b')]
    pub batch_size: Option<usize>,

    /// Maximum concurrent upsert calls
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Create the collection before loading if it doesn't exist
    #[arg(long)]
    pub create: bool,

    /// Parse and validate the input without contacting the store
    #[arg(long)]
    pub dry_run: bool,
}

/// Handle the ingest command.
pub async fn handle_ingest(
    args: IngestArgs,
    format: OutputFormat,
    verbose: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let collection = args
        .collection
        .unwrap_or_else(|| config.store.collection.clone());
    let batch_size = args.batch_size.unwrap_or(config.ingest.batch_size);
    let concurrency = args.concurrency.unwrap_or(config.ingest.max_concurrency);

    let input = read_input(args.file.as_deref())?;
    let records = parse_records(&input).context("failed to parse records")?;

    if records.is_empty() {
        println!("{}", formatter.format_message("No records found in input."));
        return Ok(());
    }

    validate_records(&records).context("invalid input records")?;

    if verbose {
        println!(
            "Loaded {} records ({}-dimensional)",
            records.len(),
            records[0].dimension()
        );
    }

    if args.dry_run {
        let batches = split_into_batches(records, batch_size)?;
        println!(
            "{}",
            formatter.format_message(&format!(
                "Dry run: would load {} batches of at most {} records into '{}'",
                batches.len(),
                batch_size,
                collection
            ))
        );
        return Ok(());
    }

    let dimension = records[0].dimension() as u64;
    let total_records = records.len();
    let batches_total = if batch_size > 0 {
        total_records.div_ceil(batch_size)
    } else {
        0
    };

    let store: Arc<dyn VectorStore> = Arc::from(create_backend(&config.store)?);

    if args.create {
        store
            .create_collection(&collection, dimension)
            .await
            .context("failed to create collection")?;
        if verbose {
            println!("Ensured collection '{}' exists", collection);
        }
    }

    let pb = ProgressBar::new(batches_total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let pb_ticker = pb.clone();
    let pipeline = IngestPipeline::new(store, concurrency)
        .on_batch_done(move |_outcome| pb_ticker.inc(1));

    let report = match pipeline
        .ingest(&collection, records, batch_size, &cancel)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    pb.finish_and_clear();

    let stats = IngestStats {
        collection: collection.clone(),
        records_total: report.records_total as u64,
        batches_total: report.batches_total as u64,
        batches_failed: report.failures.len() as u64,
        records_failed: report.records_failed() as u64,
        duration_ms: report.elapsed.as_millis() as u64,
        finished_at: chrono::Utc::now().to_rfc3339(),
        failures: report
            .failures
            .iter()
            .map(|f| FailureLine {
                batch_index: f.batch_index as u64,
                records: f.records as u64,
                error: f.error.to_string(),
            })
            .collect(),
    };
    print!("{}", formatter.format_ingest_stats(&stats));

    if !report.succeeded() {
        anyhow::bail!(
            "{} of {} batches failed",
            report.failures.len(),
            report.batches_total
        );
    }

    Ok(())
}

/// Read input from file or stdin.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path.to_string_lossy() != "-" => {
            std::fs::read_to_string(path).context("failed to read file")
        }
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}
