use std::fmt::Write as FmtWrite;

use crate::models::OutputFormat;

pub trait Formatter {
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_collection(&self, info: &CollectionStats) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Presentation view of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub collection: String,
    pub records_total: u64,
    pub batches_total: u64,
    pub batches_failed: u64,
    pub records_failed: u64,
    pub duration_ms: u64,
    pub finished_at: String,
    pub failures: Vec<FailureLine>,
}

#[derive(Debug, Clone)]
pub struct FailureLine {
    pub batch_index: u64,
    pub records: u64,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub store_url: String,
    pub store_connected: bool,
    pub collection: String,
    pub collection_exists: bool,
    pub points_count: u64,
}

#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub name: String,
    pub exists: bool,
    pub points_count: u64,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        if stats.batches_failed == 0 {
            writeln!(output, "Ingestion Complete").unwrap();
            writeln!(output, "------------------").unwrap();
        } else {
            writeln!(output, "Ingestion Failed").unwrap();
            writeln!(output, "----------------").unwrap();
        }
        writeln!(output, "Collection:     {}", stats.collection).unwrap();
        writeln!(output, "Records:        {}", stats.records_total).unwrap();
        writeln!(output, "Batches:        {}", stats.batches_total).unwrap();
        if stats.batches_failed > 0 {
            writeln!(output, "Batches failed: {}", stats.batches_failed).unwrap();
            writeln!(output, "Records failed: {}", stats.records_failed).unwrap();
        }
        writeln!(output, "Duration:       {}ms", stats.duration_ms).unwrap();

        if !stats.failures.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "Failures").unwrap();
            writeln!(output, "--------").unwrap();
            for failure in &stats.failures {
                writeln!(
                    output,
                    "  batch {} ({} records): {}",
                    failure.batch_index, failure.records, failure.error
                )
                .unwrap();
            }
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let store_status = if status.store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Vector Store:  {}", store_status).unwrap();
        writeln!(output, "  URL:         {}", status.store_url).unwrap();
        if status.store_connected {
            writeln!(output, "  Collection:  {}", status.collection).unwrap();
            if status.collection_exists {
                writeln!(output, "  Points:      {}", status.points_count).unwrap();
            } else {
                writeln!(output, "  Points:      (collection does not exist)").unwrap();
            }
        }

        output
    }

    fn format_collection(&self, info: &CollectionStats) -> String {
        let mut output = String::new();
        writeln!(output, "Collection: {}", info.name).unwrap();
        if info.exists {
            writeln!(output, "  Points: {}", info.points_count).unwrap();
        } else {
            writeln!(output, "  (does not exist)").unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(json).unwrap()
        } else {
            serde_json::to_string(json).unwrap()
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let failures: Vec<serde_json::Value> = stats
            .failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "batch_index": f.batch_index,
                    "records": f.records,
                    "error": f.error,
                })
            })
            .collect();

        let json = serde_json::json!({
            "collection": stats.collection,
            "succeeded": stats.batches_failed == 0,
            "records_total": stats.records_total,
            "batches_total": stats.batches_total,
            "batches_failed": stats.batches_failed,
            "records_failed": stats.records_failed,
            "duration_ms": stats.duration_ms,
            "finished_at": stats.finished_at,
            "failures": failures,
        });

        self.render(&json)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "vector_store": {
                "url": status.store_url,
                "connected": status.store_connected,
                "collection": status.collection,
                "collection_exists": status.collection_exists,
                "points": status.points_count,
            }
        });

        self.render(&json)
    }

    fn format_collection(&self, info: &CollectionStats) -> String {
        let json = serde_json::json!({
            "name": info.name,
            "exists": info.exists,
            "points": info.points_count,
        });

        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        if stats.batches_failed == 0 {
            writeln!(output, "## Ingestion Complete\n").unwrap();
        } else {
            writeln!(output, "## Ingestion Failed\n").unwrap();
        }
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Collection | `{}` |", stats.collection).unwrap();
        writeln!(output, "| Records | {} |", stats.records_total).unwrap();
        writeln!(output, "| Batches | {} |", stats.batches_total).unwrap();
        writeln!(output, "| Batches failed | {} |", stats.batches_failed).unwrap();
        writeln!(output, "| Records failed | {} |", stats.records_failed).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();

        if !stats.failures.is_empty() {
            writeln!(output, "\n### Failures\n").unwrap();
            writeln!(output, "| Batch | Records | Error |").unwrap();
            writeln!(output, "|-------|---------|-------|").unwrap();
            for failure in &stats.failures {
                writeln!(
                    output,
                    "| {} | {} | {} |",
                    failure.batch_index, failure.records, failure.error
                )
                .unwrap();
            }
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let store_status = if status.store_connected { "✅" } else { "❌" };
        writeln!(output, "### Vector Store {}\n", store_status).unwrap();
        writeln!(output, "- **URL:** `{}`", status.store_url).unwrap();
        writeln!(output, "- **Collection:** {}", status.collection).unwrap();
        if status.collection_exists {
            writeln!(output, "- **Points:** {}", status.points_count).unwrap();
        } else {
            writeln!(output, "- **Points:** collection does not exist").unwrap();
        }

        output
    }

    fn format_collection(&self, info: &CollectionStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Collection `{}`\n", info.name).unwrap();
        if info.exists {
            writeln!(output, "- **Points:** {}", info.points_count).unwrap();
        } else {
            writeln!(output, "- *Does not exist*").unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
