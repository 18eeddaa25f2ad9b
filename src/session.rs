//! Per-user session state: stored API keys, request history, lookup counter

use serde_json::{Value, json};

use crate::config::ApiKeys;
use crate::error::ProviderError;
use crate::history::History;
use crate::models::{LogStatus, RequestLog, SessionStats};
use crate::providers::{ProviderId, ProviderRegistry};

/// Session state passed explicitly into lookups instead of living in globals
#[derive(Debug, Clone, Default)]
pub struct Session {
    stored: ApiKeys,
    defaults: ApiKeys,
    history: History,
    lookup_count: u64,
}

impl Session {
    /// `defaults` (usually from the environment) back any key not stored here
    pub fn new(defaults: ApiKeys) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn store_key(&mut self, id: ProviderId, key: impl Into<String>) {
        self.stored.insert(id, key);
    }

    pub fn remove_key(&mut self, id: ProviderId) -> bool {
        self.stored.remove(id).is_some()
    }

    /// Stored keys over defaults, optionally overridden per request
    pub fn keys(&self, overrides: &ApiKeys) -> ApiKeys {
        overrides.merged_over(&self.stored.merged_over(&self.defaults))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Run one provider lookup, then log it to the history.
    ///
    /// The counter counts attempts, successful or not.
    pub async fn lookup(
        &mut self,
        registry: &ProviderRegistry,
        id: ProviderId,
        input: &str,
        api_key: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let mut overrides = ApiKeys::new();
        if let Some(key) = api_key {
            overrides.insert(id, key);
        }
        let keys = self.keys(&overrides);

        let result = registry.call(id, input, &keys).await;
        self.record_lookup(id, input, &result);
        result
    }

    /// Count a finished lookup and add it to the history
    pub fn record_lookup(
        &mut self,
        id: ProviderId,
        input: &str,
        result: &Result<Value, ProviderError>,
    ) {
        self.lookup_count += 1;

        let (status, response) = match result {
            Ok(data) => (LogStatus::Success, data.clone()),
            Err(e) => (LogStatus::Failed, json!({ "error": e.to_string() })),
        };

        tracing::info!(
            provider = id.as_str(),
            indicator = %input.trim(),
            status = %status,
            "Lookup recorded"
        );

        self.history
            .record(RequestLog::new(id.display_name(), input.trim(), status, response));
    }

    pub fn stats(&self) -> SessionStats {
        let keys = self.keys(&ApiKeys::new());
        SessionStats {
            lookup_count: self.lookup_count,
            history_total: self.history.entries().len(),
            history_success: self.history.count(LogStatus::Success),
            history_failed: self.history.count(LogStatus::Failed),
            configured_providers: keys.configured().map(|id| id.to_string()).collect(),
        }
    }
}
