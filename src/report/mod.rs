//! Multi-provider report pipeline

pub mod summary;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::config::ApiKeys;
use crate::error::ReportError;
use crate::models::{AggregateReport, ChartPoint, Indicator, ProviderOutcome};
use crate::providers::{ProviderId, ProviderRegistry};

pub use summary::{GeminiSummarizer, Summarizer, TemplateSummarizer};

pub const UNKNOWN_SERVICE: &str = "Unknown service";
pub const KEY_NOT_CONFIGURED: &str = "API key not configured for this service.";

/// Fans out to the selected providers and merges their results
pub struct ReportGenerator {
    registry: Arc<ProviderRegistry>,
    summarizer: Arc<dyn Summarizer>,
}

impl ReportGenerator {
    pub fn new(registry: Arc<ProviderRegistry>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            registry,
            summarizer,
        }
    }

    /// Query every selected provider concurrently.
    ///
    /// Returns exactly one entry per distinct requested id. Failures are
    /// recorded as `{error}` for that provider only.
    pub async fn collect(
        &self,
        indicator: &str,
        selected: &[String],
        keys: &ApiKeys,
    ) -> BTreeMap<String, ProviderOutcome> {
        let mut raw_data = BTreeMap::new();
        let mut seen = BTreeSet::new();
        let mut calls = vec![];

        for name in selected {
            if !seen.insert(name.as_str()) {
                continue;
            }

            let id = match name.parse::<ProviderId>() {
                Ok(id) => id,
                Err(_) => {
                    raw_data.insert(name.clone(), ProviderOutcome::error(UNKNOWN_SERVICE));
                    continue;
                }
            };

            if id.requires_key() && keys.get(id).is_none() {
                raw_data.insert(name.clone(), ProviderOutcome::error(KEY_NOT_CONFIGURED));
                continue;
            }

            let registry = &self.registry;
            calls.push(async move {
                let outcome = match registry.call(id, indicator, keys).await {
                    Ok(data) => ProviderOutcome::Data(data),
                    Err(e) => {
                        tracing::warn!(
                            provider = id.as_str(),
                            indicator = %indicator,
                            error = %e,
                            "Provider lookup failed"
                        );
                        ProviderOutcome::error(e.to_string())
                    }
                };
                (id.as_str().to_string(), outcome)
            });
        }

        raw_data.extend(join_all(calls).await);
        raw_data
    }

    /// Build a full report: provider data, summary and chart data
    pub async fn generate_report(
        &self,
        indicator: &str,
        selected: &[String],
        keys: &ApiKeys,
    ) -> Result<AggregateReport, ReportError> {
        let Indicator { value, ioc_type } = Indicator::new(indicator);
        let indicator = value.as_str();
        if indicator.is_empty() {
            return Err(ReportError::InvalidRequest("indicator is empty".into()));
        }
        if selected.is_empty() {
            return Err(ReportError::InvalidRequest("no services selected".into()));
        }

        tracing::info!(
            indicator = %indicator,
            ioc_type = %ioc_type,
            services = selected.len(),
            summarizer = self.summarizer.name(),
            "Generating report"
        );

        let raw_data = self.collect(indicator, selected, keys).await;

        let summary = match self.summarizer.summarize(indicator, &raw_data).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(indicator = %indicator, error = %e, "Summary generation failed");
                return Err(ReportError::GenerationFailed {
                    message: format!("{e:#}"),
                    raw_data,
                });
            }
        };

        let chart_data = chart_data(&raw_data);

        Ok(AggregateReport {
            summary,
            raw_data,
            chart_data,
        })
    }
}

/// VirusTotal detection counts, when the VirusTotal result has analysis stats
pub fn chart_data(raw_data: &BTreeMap<String, ProviderOutcome>) -> Vec<ChartPoint> {
    let stats = raw_data
        .get(ProviderId::VirusTotal.as_str())
        .and_then(ProviderOutcome::data)
        .and_then(|d| d.pointer("/data/attributes/last_analysis_stats"))
        .and_then(Value::as_object);

    match stats {
        Some(stats) => {
            let count = |k: &str| stats.get(k).and_then(Value::as_u64).unwrap_or(0);
            vec![ChartPoint {
                name: "VT Analysis".to_string(),
                malicious: count("malicious"),
                suspicious: count("suspicious"),
            }]
        }
        None => vec![],
    }
}
