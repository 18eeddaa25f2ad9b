//! IBM X-Force Exchange provider

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;
use url::Url;

use crate::error::ProviderError;
use crate::models::IocType;
use crate::models::ioc_utils::classify;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};

/// IBM X-Force provider.
///
/// The configured key is the `key:password` pair; it is sent as HTTP Basic
/// credentials.
pub struct XForceProvider {
    http: HttpFetcher,
    base_url: String,
}

impl XForceProvider {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint for a resource: `/ipr` for IPs, `/url` for URLs and domains,
    /// `/malware` for hashes
    pub fn resource_url(&self, resource: &str) -> Result<Url, ProviderError> {
        let collection = match classify(resource) {
            IocType::Ipv4 => "ipr",
            IocType::Url | IocType::Domain => "url",
            IocType::Hash => "malware",
        };

        endpoint(ProviderId::XForce, &self.base_url, &[collection, resource])
    }

    pub fn authorization(key: &str) -> String {
        format!("Basic {}", STANDARD.encode(key))
    }
}

#[async_trait]
impl Provider for XForceProvider {
    fn id(&self) -> ProviderId {
        ProviderId::XForce
    }

    async fn lookup(&self, resource: &str, key: &str) -> Result<Value, ProviderError> {
        let request = self
            .http
            .client()
            .get(self.resource_url(resource)?)
            .header("Authorization", Self::authorization(key));

        self.http.fetch_json(ProviderId::XForce, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn picks_collection_by_indicator_type() {
        let http = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let p = XForceProvider::new(http, "https://api.xforce.ibmcloud.com");

        assert_eq!(
            p.resource_url("1.2.3.4").unwrap().as_str(),
            "https://api.xforce.ibmcloud.com/ipr/1.2.3.4"
        );
        assert_eq!(
            p.resource_url("example.com").unwrap().as_str(),
            "https://api.xforce.ibmcloud.com/url/example.com"
        );
        assert_eq!(
            p.resource_url("d41d8cd98f00b204e9800998ecf8427e").unwrap().as_str(),
            "https://api.xforce.ibmcloud.com/malware/d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn basic_auth_is_base64_of_key() {
        assert_eq!(XForceProvider::authorization("key:pass"), "Basic a2V5OnBhc3M=");
    }
}
