//! AlienVault OTX indicator provider

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use crate::error::ProviderError;
use crate::models::IocType;
use crate::models::ioc_utils::classify;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};

/// AlienVault OTX provider.
///
/// Reads the `general` section, then for domains follows the `whois` link
/// into `whois_data` and for IPs and domains pulls the `passive_dns` section.
/// A 404 is an unknown indicator and comes back as data.
pub struct AlienVaultProvider {
    http: HttpFetcher,
    base_url: String,
}

impl AlienVaultProvider {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// OTX section name for an indicator type
    pub fn section_type(ioc_type: IocType) -> &'static str {
        match ioc_type {
            IocType::Ipv4 => "IPv4",
            IocType::Domain => "domain",
            IocType::Url => "url",
            IocType::Hash => "file",
        }
    }

    /// `{base}/indicators/{type}/{resource}/{section}` with the resource
    /// percent-encoded as a single path segment
    pub fn section_url(&self, ioc_type: IocType, resource: &str, section: &str) -> Result<Url, ProviderError> {
        endpoint(
            ProviderId::AlienVault,
            &self.base_url,
            &["indicators", Self::section_type(ioc_type), resource, section],
        )
    }

    fn request(&self, url: Url, key: &str) -> reqwest::RequestBuilder {
        self.http.client().get(url).header("X-OTX-API-KEY", key)
    }
}

#[async_trait]
impl Provider for AlienVaultProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AlienVault
    }

    async fn lookup(&self, resource: &str, key: &str) -> Result<Value, ProviderError> {
        let ioc_type = classify(resource);
        let general = self.section_url(ioc_type, resource, "general")?;

        let mut data = match self
            .http
            .fetch_json(ProviderId::AlienVault, self.request(general, key))
            .await
        {
            Ok(data) => data,
            Err(ProviderError::VendorHttp { status: 404, .. }) => {
                return Ok(json!({
                    "message": format!("{} was not found in AlienVault OTX.", resource),
                }));
            }
            Err(e) => return Err(e),
        };

        if ioc_type == IocType::Domain {
            let whois_link = data.get("whois").and_then(Value::as_str).map(str::to_string);
            if let Some(link) = whois_link {
                let request = self.http.client().get(&link).header("X-OTX-API-KEY", key);
                match self.http.fetch_text(ProviderId::AlienVault, request).await {
                    Ok(text) => {
                        if let Some(obj) = data.as_object_mut() {
                            obj.insert("whois_data".to_string(), Value::String(text));
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            provider = "alienvault",
                            enrichment = "whois",
                            error = %e,
                            "Secondary lookup failed"
                        );
                    }
                }
            }
        }

        if matches!(ioc_type, IocType::Ipv4 | IocType::Domain) {
            let url = self.section_url(ioc_type, resource, "passive_dns")?;
            if let Some(passive_dns) = self
                .http
                .fetch_optional(ProviderId::AlienVault, "passive_dns", self.request(url, key))
                .await
            {
                if let Some(obj) = data.as_object_mut() {
                    obj.insert("passive_dns".to_string(), passive_dns);
                }
            }
        }

        Ok(data)
    }
}
