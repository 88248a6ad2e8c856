// ============================================================
// Layer 4 — Labeled Snapshot Loader
// ============================================================
// Reads the labeling tool's JSON export: a top-level array of
// objects, each with a `title` and a `category` string.
//
//   [
//     {"title": "关于2025年国庆节放假安排的通知", "category": "放假通知"},
//     {"title": "人工智能前沿讲座", "category": "学术活动"},
//     ...
//   ]
//
// Missing (or null) fields read as empty strings. An item that
// is not an object, or whose fields are not strings, is skipped
// and reported as a MalformedRecord observation. Only a file
// that cannot be read or is not a JSON array is fatal.

use std::{fs, path::PathBuf};

use serde_json::Value;

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::observation::{Observation, Observations};
use crate::domain::record::RawRecord;
use crate::domain::traits::RecordSource;

pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonRecordSource {
    fn load(&self, observations: &mut Observations) -> PipelineResult<Vec<RawRecord>> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            PipelineError::data_format(format!("cannot read '{}': {e}", self.path.display()))
        })?;
        let records = parse_export(&text, observations)?;
        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

/// Parse an export document into records, skipping malformed items.
pub fn parse_export(text: &str, observations: &mut Observations) -> PipelineResult<Vec<RawRecord>> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| PipelineError::data_format(format!("export is not valid JSON: {e}")))?;

    let Value::Array(items) = doc else {
        return Err(PipelineError::data_format("export must be a JSON array of records"));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match parse_item(item) {
            Ok(record)  => records.push(record.at(index)),
            Err(reason) => observations.record(Observation::MalformedRecord { index, reason }),
        }
    }
    Ok(records)
}

fn parse_item(item: &Value) -> Result<RawRecord, String> {
    let Value::Object(fields) = item else {
        return Err("record is not an object".to_string());
    };
    let title    = string_field(fields.get("title"), "title")?;
    let category = string_field(fields.get("category"), "category")?;
    Ok(RawRecord::new(title.trim(), category.trim()))
}

fn string_field(value: Option<&Value>, name: &str) -> Result<String, String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s))   => Ok(s.clone()),
        Some(other)              => Err(format!("field '{name}' is not a string: {other}")),
    }
}
