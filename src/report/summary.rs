//! Report summaries: deterministic template or LLM-written

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::models::ProviderOutcome;
use crate::providers::{HttpFetcher, ProviderId};

/// Turns collected provider data into a markdown summary
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(
        &self,
        indicator: &str,
        raw_data: &BTreeMap<String, ProviderOutcome>,
    ) -> Result<String>;
}

fn service_label(id: &str) -> String {
    match id.parse::<ProviderId>() {
        Ok(p) => p.display_name().to_string(),
        Err(_) => id.to_string(),
    }
}

/// Lists which providers answered and which failed
pub struct TemplateSummarizer;

#[async_trait]
impl Summarizer for TemplateSummarizer {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn summarize(
        &self,
        indicator: &str,
        raw_data: &BTreeMap<String, ProviderOutcome>,
    ) -> Result<String> {
        Ok(template_summary(indicator, raw_data))
    }
}

pub fn template_summary(indicator: &str, raw_data: &BTreeMap<String, ProviderOutcome>) -> String {
    let (failed, succeeded): (Vec<_>, Vec<_>) =
        raw_data.iter().partition(|(_, outcome)| outcome.is_error());

    let mut out = String::new();
    let _ = writeln!(out, "## Threat intelligence summary for `{}`\n", indicator);
    let _ = writeln!(
        out,
        "Queried {} service(s): {} returned data, {} failed.",
        raw_data.len(),
        succeeded.len(),
        failed.len()
    );

    if !succeeded.is_empty() {
        out.push_str("\n### Returned data\n");
        for (id, outcome) in &succeeded {
            let _ = write!(out, "- **{}**", service_label(id));
            if let Some(stats) = outcome
                .data()
                .and_then(|d| d.pointer("/data/attributes/last_analysis_stats"))
            {
                let count = |k: &str| stats.get(k).and_then(Value::as_u64).unwrap_or(0);
                let _ = write!(
                    out,
                    ": {} malicious, {} suspicious detections",
                    count("malicious"),
                    count("suspicious")
                );
            }
            out.push('\n');
        }
    }

    if !failed.is_empty() {
        out.push_str("\n### Failed\n");
        for (id, outcome) in &failed {
            if let ProviderOutcome::Error { error } = outcome {
                let _ = writeln!(out, "- **{}**: {}", service_label(id), error);
            }
        }
    }

    out.trim_end().to_string()
}

const ANALYST_PROMPT: &str = "You are a senior threat intelligence analyst. Based on the following data from various security services, \
generate a concise, markdown-formatted summary for the indicator.

Your summary should include:
- A high-level assessment of the indicator's risk.
- Key findings from each service that returned data.
- Specific details like reputation scores, malicious detections, and important WHOIS or network context.
- Conclude with a recommendation for how to handle this indicator (e.g., block, monitor, allow).";

/// Gemini `generateContent` summarizer
pub struct GeminiSummarizer {
    http: HttpFetcher,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiSummarizer {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";

    pub fn new(http: HttpFetcher, base_url: &str, model: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    /// Prompt text: analyst persona followed by `{indicator, rawData}` as JSON
    pub fn prompt(indicator: &str, raw_data: &BTreeMap<String, ProviderOutcome>) -> Result<String> {
        let payload = json!({ "indicator": indicator, "rawData": raw_data });
        let data = serde_json::to_string_pretty(&payload).context("Failed to serialize report data")?;
        Ok(format!(
            "{}\n\nIndicator: \"{}\"\n\nHere is the raw data:\n{}",
            ANALYST_PROMPT, indicator, data
        ))
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn summarize(
        &self,
        indicator: &str,
        raw_data: &BTreeMap<String, ProviderOutcome>,
    ) -> Result<String> {
        let prompt = Self::prompt(indicator, raw_data)?;

        let response = self
            .http
            .client()
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error: {} - {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let text: String = body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();

        if text.trim().is_empty() {
            anyhow::bail!("Gemini returned no summary text");
        }

        Ok(text)
    }
}
