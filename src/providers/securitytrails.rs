//! SecurityTrails v1 provider

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::models::ioc_utils::is_ipv4;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};

/// SecurityTrails provider.
///
/// Domains get the full domain record plus `whois` and `subdomains`; IPs get
/// the reverse-IP domain list. A 404 means SecurityTrails has no such lookup
/// for the resource and is returned as data, not as an error.
pub struct SecurityTrailsProvider {
    http: HttpFetcher,
    base_url: String,
}

impl SecurityTrailsProvider {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, segments: &[&str], key: &str) -> Result<reqwest::RequestBuilder, ProviderError> {
        let url = endpoint(ProviderId::SecurityTrails, &self.base_url, segments)?;
        Ok(self.http.client().get(url).header("APIKEY", key))
    }
}

#[async_trait]
impl Provider for SecurityTrailsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::SecurityTrails
    }

    async fn lookup(&self, resource: &str, key: &str) -> Result<Value, ProviderError> {
        let is_ip = is_ipv4(resource);
        let primary = if is_ip {
            self.request(&["ip", resource, "domains"], key)?
        } else {
            self.request(&["domain", resource], key)?
        };

        let mut data = match self
            .http
            .fetch_json(ProviderId::SecurityTrails, primary)
            .await
        {
            Ok(data) => data,
            Err(ProviderError::VendorHttp { status: 404, .. }) => {
                return Ok(json!({
                    "status": "unsupported_lookup",
                    "message": format!(
                        "SecurityTrails does not support this lookup type for: {}",
                        resource
                    ),
                }));
            }
            Err(e) => return Err(e),
        };

        if is_ip {
            return Ok(data);
        }

        let whois = self.request(&["domain", resource, "whois"], key)?;
        let subdomains = self.request(&["domain", resource, "subdomains"], key)?;
        let (whois, subdomains) = futures::join!(
            self.http
                .fetch_optional(ProviderId::SecurityTrails, "whois", whois),
            self.http
                .fetch_optional(ProviderId::SecurityTrails, "subdomains", subdomains),
        );

        if let Some(obj) = data.as_object_mut() {
            if let Some(whois) = whois {
                obj.insert("whois".to_string(), whois);
            }
            if let Some(list) = subdomains.and_then(|mut s| s.get_mut("subdomains").map(Value::take)) {
                obj.insert("subdomains".to_string(), list);
            }
        }

        Ok(data)
    }
}
