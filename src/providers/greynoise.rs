//! GreyNoise community API provider

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};

pub const NOT_OBSERVED: &str = "This IP address was not found in the GreyNoise dataset.";

/// GreyNoise provider. A 404 means the IP was never observed scanning.
pub struct GreyNoiseProvider {
    http: HttpFetcher,
    base_url: String,
}

impl GreyNoiseProvider {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Provider for GreyNoiseProvider {
    fn id(&self) -> ProviderId {
        ProviderId::GreyNoise
    }

    async fn lookup(&self, ip: &str, key: &str) -> Result<Value, ProviderError> {
        let url = endpoint(ProviderId::GreyNoise, &self.base_url, &["v3", "community", ip])?;
        let request = self.http.client().get(url).header("key", key);

        match self.http.fetch_json(ProviderId::GreyNoise, request).await {
            Err(ProviderError::VendorHttp { status: 404, .. }) => {
                Ok(json!({ "message": NOT_OBSERVED }))
            }
            other => other,
        }
    }
}
