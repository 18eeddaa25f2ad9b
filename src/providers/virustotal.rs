//! VirusTotal v3 provider

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;
use url::Url;

use crate::error::ProviderError;
use crate::models::IocType;
use crate::models::ioc_utils::classify;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};

/// VirusTotal provider
pub struct VirusTotalProvider {
    http: HttpFetcher,
    base_url: String,
}

impl VirusTotalProvider {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Collection and object id for a resource, e.g. `("ip_addresses", "8.8.8.8")`
    pub fn object_id(resource: &str) -> (&'static str, String) {
        match classify(resource) {
            IocType::Ipv4 => ("ip_addresses", resource.to_string()),
            IocType::Domain => ("domains", resource.to_string()),
            IocType::Url => ("urls", URL_SAFE_NO_PAD.encode(resource)),
            IocType::Hash => ("files", resource.to_string()),
        }
    }

    /// Object URL, or one of its relationship URLs when `section` is set
    fn object_url(&self, resource: &str, section: Option<&str>) -> Result<Url, ProviderError> {
        let (collection, object) = Self::object_id(resource);
        let mut segments = vec![collection, object.as_str()];
        segments.extend(section);
        endpoint(ProviderId::VirusTotal, &self.base_url, &segments)
    }

    async fn get(&self, url: Url, key: &str) -> Result<Value, ProviderError> {
        let request = self.http.client().get(url).header("x-apikey", key);
        self.http.fetch_json(ProviderId::VirusTotal, request).await
    }

    async fn get_optional(&self, url: Url, key: &str, what: &'static str) -> Option<Value> {
        let request = self.http.client().get(url).header("x-apikey", key);
        self.http
            .fetch_optional(ProviderId::VirusTotal, what, request)
            .await
    }
}

/// Put `value` at `data.attributes.<field>` when the primary document has room for it
fn splice_attribute(doc: &mut Value, field: &str, value: Value) {
    if let Some(attrs) = doc
        .pointer_mut("/data/attributes")
        .and_then(Value::as_object_mut)
    {
        attrs.insert(field.to_string(), value);
    }
}

#[async_trait]
impl Provider for VirusTotalProvider {
    fn id(&self) -> ProviderId {
        ProviderId::VirusTotal
    }

    async fn lookup(&self, resource: &str, key: &str) -> Result<Value, ProviderError> {
        let ioc_type = classify(resource);
        let mut result = self.get(self.object_url(resource, None)?, key).await?;

        if !matches!(ioc_type, IocType::Ipv4 | IocType::Domain) {
            return Ok(result);
        }

        let whois_url = self.object_url(resource, Some("whois"))?;
        let resolutions_url = self.object_url(resource, Some("resolutions"))?;
        let subdomains_url = self.object_url(resource, Some("subdomains"))?;

        let (whois, resolutions, subdomains) = futures::join!(
            self.get_optional(whois_url, key, "whois"),
            self.get_optional(resolutions_url, key, "resolutions"),
            async {
                if ioc_type == IocType::Domain {
                    self.get_optional(subdomains_url, key, "subdomains").await
                } else {
                    None
                }
            },
        );

        if let Some(text) = whois
            .as_ref()
            .and_then(|w| w.pointer("/data/attributes/whois"))
            .and_then(Value::as_str)
        {
            splice_attribute(&mut result, "whois", Value::String(text.to_string()));
        }

        if let Some(Value::Array(items)) = resolutions.and_then(|mut r| r.get_mut("data").map(Value::take)) {
            splice_attribute(&mut result, "resolutions", Value::Array(items));
        }

        if let Some(Value::Array(items)) = subdomains.and_then(|mut s| s.get_mut("data").map(Value::take)) {
            splice_attribute(&mut result, "subdomains", Value::Array(items));
        }

        Ok(result)
    }
}
