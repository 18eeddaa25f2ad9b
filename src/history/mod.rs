//! Session request history with JSON/CSV/TXT import and export

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{LogStatus, RequestLog};

/// History import/export failures
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Unsupported file format: {0}. Please use JSON, CSV, or TXT.")]
    UnsupportedFormat(String),

    #[error("Invalid JSON history: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV history: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid log entry on row {row}: {reason}")]
    InvalidEntry { row: usize, reason: String },

    #[error("Invalid TXT content, expected JSON or CSV format.")]
    InvalidText,
}

/// File formats the history can be exchanged in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Txt => "text/plain",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "zeroshark_history.json",
            ExportFormat::Csv => "zeroshark_history.csv",
            ExportFormat::Txt => "zeroshark_history.txt",
        }
    }

    /// Pick the format from a file name's extension
    pub fn from_file_name(name: &str) -> Result<Self, HistoryError> {
        let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some(ext) => ext.parse(),
            None => Err(HistoryError::UnsupportedFormat(name.to_string())),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "txt" => Ok(ExportFormat::Txt),
            other => Err(HistoryError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Flat CSV row; `response` holds the JSON text, quoted by the CSV writer
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    service: String,
    target: String,
    date: String,
    status: String,
    response: String,
}

/// In-memory request history, newest first
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<RequestLog>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, log: RequestLog) {
        self.entries.insert(0, log);
    }

    pub fn entries(&self) -> &[RequestLog] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the history with imported entries, keeping their order
    pub fn replace(&mut self, entries: Vec<RequestLog>) {
        self.entries = entries;
    }

    pub fn count(&self, status: LogStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Entries whose target or service contains `query`, case-insensitive
    pub fn search(&self, query: &str) -> Vec<RequestLog> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|log| {
                log.target.to_lowercase().contains(&query)
                    || log.service.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }
}

/// Serialize logs in the requested format
pub fn export(logs: &[RequestLog], format: ExportFormat) -> Result<String, HistoryError> {
    match format {
        ExportFormat::Json | ExportFormat::Txt => Ok(serde_json::to_string_pretty(logs)?),
        ExportFormat::Csv => export_csv(logs),
    }
}

/// Parse logs from file content in the given format
pub fn import(content: &str, format: ExportFormat) -> Result<Vec<RequestLog>, HistoryError> {
    match format {
        ExportFormat::Json => check_required(serde_json::from_str(content)?),
        ExportFormat::Csv => import_csv(content),
        ExportFormat::Txt => match serde_json::from_str(content) {
            Ok(logs) => check_required(logs),
            Err(_) if looks_like_csv(content) => import_csv(content),
            Err(_) => Err(HistoryError::InvalidText),
        },
    }
}

/// JSON entries need a non-empty id and service
fn check_required(logs: Vec<RequestLog>) -> Result<Vec<RequestLog>, HistoryError> {
    if let Some(index) = logs
        .iter()
        .position(|log| log.id.is_empty() || log.service.is_empty())
    {
        return Err(HistoryError::InvalidEntry {
            row: index + 1,
            reason: "id, service and date are required".into(),
        });
    }
    Ok(logs)
}

fn looks_like_csv(content: &str) -> bool {
    content
        .lines()
        .next()
        .is_some_and(|header| header.split(',').count() >= 2)
}

fn export_csv(logs: &[RequestLog]) -> Result<String, HistoryError> {
    let mut writer = csv::Writer::from_writer(vec![]);

    for log in logs {
        writer.serialize(CsvRow {
            id: log.id.clone(),
            service: log.service.clone(),
            target: log.target.clone(),
            date: log.date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            status: log.status.to_string(),
            response: serde_json::to_string(&log.response)?,
        })?;
    }

    // An empty history still gets a header row
    if logs.is_empty() {
        writer.write_record(["id", "service", "target", "date", "status", "response"])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| HistoryError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn import_csv(content: &str) -> Result<Vec<RequestLog>, HistoryError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut logs = vec![];

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        let line = index + 2;
        let invalid = |reason: String| HistoryError::InvalidEntry { row: line, reason };

        if row.id.is_empty() || row.service.is_empty() || row.date.is_empty() {
            return Err(invalid("id, service and date are required".into()));
        }

        let date: DateTime<Utc> = DateTime::parse_from_rfc3339(&row.date)
            .map_err(|e| invalid(format!("bad date {:?}: {}", row.date, e)))?
            .with_timezone(&Utc);
        let status: LogStatus = row.status.parse().map_err(invalid)?;
        let response: Value = if row.response.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&row.response)
                .map_err(|e| invalid(format!("bad response JSON: {e}")))?
        };

        logs.push(RequestLog {
            id: row.id,
            service: row.service,
            target: row.target,
            date,
            status,
            response,
        });
    }

    Ok(logs)
}
