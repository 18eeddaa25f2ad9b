//! Core data models for indicator lookups and reports

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

pub mod ioc_utils;

/// Kinds of indicator the providers understand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IocType {
    Ipv4,
    Domain,
    Url,
    Hash,
}

impl std::fmt::Display for IocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IocType::Ipv4 => write!(f, "ipv4"),
            IocType::Domain => write!(f, "domain"),
            IocType::Url => write!(f, "url"),
            IocType::Hash => write!(f, "hash"),
        }
    }
}

/// A user-supplied indicator, classified once at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub value: String,
    pub ioc_type: IocType,
}

impl Indicator {
    pub fn new(value: &str) -> Self {
        let value = value.trim().to_string();
        let ioc_type = ioc_utils::classify(&value);
        Self { value, ioc_type }
    }
}

/// The input field a provider expects from the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    IpAddress,
    Query,
    Resource,
}

/// Result of a single provider inside a report: vendor data or an error.
///
/// Serialized untagged, so the JSON is either the vendor document itself or
/// `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderOutcome {
    Error { error: String },
    Data(Value),
}

impl ProviderOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        ProviderOutcome::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ProviderOutcome::Error { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ProviderOutcome::Data(v) => Some(v),
            ProviderOutcome::Error { .. } => None,
        }
    }
}

/// One bar of the report chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub malicious: u64,
    pub suspicious: u64,
}

/// Consolidated multi-provider report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub summary: String,
    pub raw_data: BTreeMap<String, ProviderOutcome>,
    pub chart_data: Vec<ChartPoint>,
}

/// Outcome status of a logged lookup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogStatus {
    Success,
    Failed,
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStatus::Success => write!(f, "Success"),
            LogStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl std::str::FromStr for LogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(LogStatus::Success),
            "Failed" => Ok(LogStatus::Failed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// A single entry of the session request history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLog {
    pub id: String,
    pub service: String,
    pub target: String,
    pub date: DateTime<Utc>,
    pub status: LogStatus,
    pub response: Value,
}

impl RequestLog {
    pub fn new(service: &str, target: &str, status: LogStatus, response: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            service: service.to_string(),
            target: target.to_string(),
            date: Utc::now(),
            status,
            response,
        }
    }
}

/// API request for a single-provider lookup
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    #[validate(length(min = 1, max = 2048))]
    pub input: String,
    pub api_key: Option<String>,
}

/// API request for a consolidated report
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[validate(length(min = 1, max = 2048))]
    pub indicator: String,
    #[validate(length(min = 1))]
    pub services: Vec<String>,
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
}

/// API request to store a key in the session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoreKeyRequest {
    #[validate(length(min = 1))]
    pub api_key: String,
}

/// Session statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub lookup_count: u64,
    pub history_total: usize,
    pub history_success: usize,
    pub history_failed: usize,
    pub configured_providers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_serializes_as_vendor_json_or_error_object() {
        let ok = ProviderOutcome::Data(json!({ "data": { "id": "8.8.8.8" } }));
        let err = ProviderOutcome::error("boom");

        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "data": { "id": "8.8.8.8" } }));
        assert_eq!(serde_json::to_value(&err).unwrap(), json!({ "error": "boom" }));
    }

    #[test]
    fn outcome_deserializes_error_shape_first() {
        let parsed: ProviderOutcome = serde_json::from_value(json!({ "error": "nope" })).unwrap();
        assert!(parsed.is_error());

        let parsed: ProviderOutcome = serde_json::from_value(json!({ "message": "hi" })).unwrap();
        assert_eq!(parsed.data(), Some(&json!({ "message": "hi" })));
    }

    #[test]
    fn report_uses_camel_case_keys() {
        let report = AggregateReport {
            summary: "s".into(),
            raw_data: BTreeMap::new(),
            chart_data: vec![],
        };
        let v = serde_json::to_value(&report).unwrap();
        assert!(v.get("rawData").is_some());
        assert!(v.get("chartData").is_some());
    }

    #[test]
    fn indicator_trims_and_classifies() {
        let ind = Indicator::new("  8.8.8.8 ");
        assert_eq!(ind.value, "8.8.8.8");
        assert_eq!(ind.ioc_type, IocType::Ipv4);
    }
}
