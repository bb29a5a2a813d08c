//! Record sinks — where admitted records go.
//!
//! The orchestrator pushes records into a `RecordSink` as they are
//! admitted. Two artifact formats are provided for downstream ingestion:
//! JSONL (one JSON object per line, append-friendly) and CSV with a
//! union-of-keys header. `VecSink` collects in memory for tests and
//! embedding.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use vnfeed_core::record::Record;

/// Errors from writing record artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("write artifact: {0}")]
    Io(String),

    #[error("serialize record: {0}")]
    Serialize(String),
}

/// Receives admitted records as they are emitted.
pub trait RecordSink {
    fn write(&mut self, record: &Record) -> Result<(), ExportError>;

    /// Flush any buffered output. Called once after the sync completes.
    fn finish(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<Record>,
}

impl RecordSink for VecSink {
    fn write(&mut self, record: &Record) -> Result<(), ExportError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// One JSON object per line, appended to a file.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Open (or create) the file for appending.
    pub fn open(path: &Path) -> Result<Self, ExportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ExportError::Io(e.to_string()))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ExportError::Io(e.to_string()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl RecordSink for JsonlSink {
    fn write(&mut self, record: &Record) -> Result<(), ExportError> {
        let line = serde_json::to_string(record)
            .map_err(|e| ExportError::Serialize(e.to_string()))?;
        writeln!(self.writer, "{line}").map_err(|e| ExportError::Io(e.to_string()))
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        self.writer
            .flush()
            .map_err(|e| ExportError::Io(e.to_string()))
    }
}

/// CSV export. Records of one stream share most fields but not all, so rows
/// are buffered and the header is the sorted union of keys, written at
/// `finish()`.
pub struct CsvSink {
    path: PathBuf,
    rows: Vec<Record>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows: Vec::new(),
        }
    }
}

impl RecordSink for CsvSink {
    fn write(&mut self, record: &Record) -> Result<(), ExportError> {
        self.rows.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ExportError::Io(e.to_string()))?;
            }
        }

        let mut columns = BTreeSet::new();
        for row in &self.rows {
            for key in row.fields().keys() {
                columns.insert(key.clone());
            }
        }
        let columns: Vec<String> = columns.into_iter().collect();

        let mut writer =
            csv::Writer::from_path(&self.path).map_err(|e| ExportError::Io(e.to_string()))?;
        writer
            .write_record(&columns)
            .map_err(|e| ExportError::Io(e.to_string()))?;

        for row in &self.rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|col| match row.get(col) {
                    None | Some(serde_json::Value::Null) => String::new(),
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect();
            writer
                .write_record(&cells)
                .map_err(|e| ExportError::Io(e.to_string()))?;
        }

        writer.flush().map_err(|e| ExportError::Io(e.to_string()))
    }
}
