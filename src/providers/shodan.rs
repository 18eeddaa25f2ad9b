//! Shodan provider

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::models::ioc_utils::is_ipv4;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};

/// Shodan provider: host lookup for IPs, host search for anything else
pub struct ShodanProvider {
    http: HttpFetcher,
    base_url: String,
}

impl ShodanProvider {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Provider for ShodanProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Shodan
    }

    async fn lookup(&self, query: &str, key: &str) -> Result<Value, ProviderError> {
        let client = self.http.client();
        let request = if is_ipv4(query) {
            client
                .get(endpoint(ProviderId::Shodan, &self.base_url, &["shodan", "host", query])?)
                .query(&[("key", key)])
        } else {
            client
                .get(endpoint(ProviderId::Shodan, &self.base_url, &["shodan", "host", "search"])?)
                .query(&[("key", key), ("query", query)])
        };

        self.http.fetch_json(ProviderId::Shodan, request).await
    }
}
