//! Reading raw records from disk.
//!
//! Two layouts are accepted: a JSON document (an array of objects, or one
//! object) and JSON Lines, picked by the `.jsonl` / `.ndjson` extension.
//! Records are parsed straight from text so each object keeps its key order.

use std::fs;
use std::path::{Path, PathBuf};

use listing::RawRecord;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordsError {
    #[error("failed to read records from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON record on line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid JSON records: {0}")]
    Document(#[from] serde_json::Error),

    #[error("expected a JSON array or object of records, found {0}")]
    Shape(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    JsonLines,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jsonl" | "ndjson") => RecordFormat::JsonLines,
            _ => RecordFormat::Json,
        }
    }
}

/// Reads every record in `path`.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>, RecordsError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| RecordsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&text, RecordFormat::from_path(path))
}

pub fn parse_records(text: &str, format: RecordFormat) -> Result<Vec<RawRecord>, RecordsError> {
    match format {
        RecordFormat::JsonLines => parse_lines(text),
        RecordFormat::Json => parse_document(text),
    }
}

fn parse_lines(text: &str) -> Result<Vec<RawRecord>, RecordsError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| RecordsError::Line {
                line: index + 1,
                source,
            })
        })
        .collect()
}

fn parse_document(text: &str) -> Result<Vec<RawRecord>, RecordsError> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    match trimmed.chars().next() {
        Some('[') => Ok(serde_json::from_str(trimmed)?),
        Some('{') => Ok(vec![serde_json::from_str(trimmed)?]),
        None => Ok(Vec::new()),
        Some(_) => Err(RecordsError::Shape("a scalar")),
    }
}
