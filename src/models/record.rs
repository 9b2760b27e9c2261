//! The record model: the unit of ingestion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;

/// A single vector record destined for a store collection.
///
/// Records are created by the caller, validated once, and then moved through
/// the pipeline unchanged until their batch's upsert call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Point id, unique within one ingestion call.
    pub id: u64,
    /// Dense vector; every record in a collection shares one dimension.
    pub vector: Vec<f32>,
    /// Arbitrary JSON payload stored alongside the vector.
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Record {
    pub fn new(id: u64, vector: Vec<f32>) -> Self {
        Self {
            id,
            vector,
            payload: Map::new(),
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Parse records from a JSON array or JSONL input.
///
/// A leading `[` selects array parsing; otherwise every non-empty line must
/// hold one record object.
pub fn parse_records(input: &str) -> Result<Vec<Record>, RecordError> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(Vec::new());
    }

    if input.starts_with('[') {
        return serde_json::from_str(input)
            .map_err(|e| RecordError::JsonParse(format!("invalid JSON array: {}", e)));
    }

    let mut records = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(line)
            .map_err(|e| RecordError::JsonParse(format!("line {}: {}", i + 1, e)))?;
        records.push(record);
    }

    Ok(records)
}

/// Check the invariants the pipeline relies on: ids unique within the call,
/// vectors non-empty and of one shared dimension.
pub fn validate_records(records: &[Record]) -> Result<(), RecordError> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    let mut expected_dim: Option<usize> = None;

    for record in records {
        if !seen.insert(record.id) {
            return Err(RecordError::DuplicateId(record.id));
        }
        if record.vector.is_empty() {
            return Err(RecordError::EmptyVector(record.id));
        }
        match expected_dim {
            None => expected_dim = Some(record.dimension()),
            Some(expected) if expected != record.dimension() => {
                return Err(RecordError::DimensionMismatch {
                    id: record.id,
                    expected,
                    actual: record.dimension(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, dim: usize) -> Record {
        Record::new(id, vec![0.5; dim])
    }

    #[test]
    fn parse_json_array() {
        let input = r#"[
            {"id": 1, "vector": [0.1, 0.2], "payload": {"title": "a"}},
            {"id": 2, "vector": [0.3, 0.4]}
        ]"#;
        let records = parse_records(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].payload.get("title").unwrap(), "a");
        assert!(records[1].payload.is_empty());
    }

    #[test]
    fn parse_jsonl() {
        let input = "{\"id\": 1, \"vector\": [0.1]}\n\n{\"id\": 2, \"vector\": [0.2]}\n";
        let records = parse_records(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn parse_array_and_jsonl_agree() {
        let array = r#"[{"id": 7, "vector": [1.0, 2.0]}]"#;
        let lines = r#"{"id": 7, "vector": [1.0, 2.0]}"#;
        let a = parse_records(array).unwrap();
        let b = parse_records(lines).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[0].vector, b[0].vector);
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("  \n ").unwrap().is_empty());
    }

    #[test]
    fn parse_reports_offending_line() {
        let input = "{\"id\": 1, \"vector\": [0.1]}\nnot json\n";
        let err = parse_records(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn validate_accepts_uniform_records() {
        let records = vec![record(1, 4), record(2, 4), record(3, 4)];
        assert!(validate_records(&records).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_id() {
        let records = vec![record(1, 4), record(1, 4)];
        match validate_records(&records) {
            Err(RecordError::DuplicateId(1)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_ragged_dimensions() {
        let records = vec![record(1, 4), record(2, 8)];
        match validate_records(&records) {
            Err(RecordError::DimensionMismatch {
                id: 2,
                expected: 4,
                actual: 8,
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_empty_vector() {
        let records = vec![record(1, 0)];
        assert!(matches!(
            validate_records(&records),
            Err(RecordError::EmptyVector(1))
        ));
    }
}
