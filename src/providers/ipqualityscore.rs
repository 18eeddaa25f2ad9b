//! IPQualityScore provider

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::models::ioc_utils::is_ipv4;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};

/// IPQualityScore provider. The key travels in the URL path.
pub struct IpQualityScoreProvider {
    http: HttpFetcher,
    base_url: String,
}

impl IpQualityScoreProvider {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Provider for IpQualityScoreProvider {
    fn id(&self) -> ProviderId {
        ProviderId::IpQualityScore
    }

    async fn lookup(&self, ip: &str, key: &str) -> Result<Value, ProviderError> {
        if !is_ipv4(ip) {
            return Err(ProviderError::InvalidInput(
                "Invalid IP address format provided.".into(),
            ));
        }

        let url = endpoint(ProviderId::IpQualityScore, &self.base_url, &["ip", key, ip])?;
        let request = self.http.client().get(url);

        self.http.fetch_json(ProviderId::IpQualityScore, request).await
    }
}
