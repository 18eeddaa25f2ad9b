//! WHOIS enrichment from RDAP

mod rdap;

pub use rdap::{LABEL_WIDTH, format_rdap_to_whois};

use serde_json::Value;

use crate::error::ProviderError;
use crate::providers::{HttpFetcher, ProviderId, endpoint};

/// Client for the ARIN RDAP registry. No authentication.
#[derive(Clone)]
pub struct RdapClient {
    http: HttpFetcher,
    base_url: String,
}

impl RdapClient {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the RDAP network object covering `ip`
    pub async fn lookup_ip(&self, ip: &str) -> Result<Value, ProviderError> {
        let url = endpoint(ProviderId::AbuseIpDb, &self.base_url, &["ip", ip])?;
        let request = self.http.client().get(url);

        // Errors are reported under the provider that asked for the enrichment.
        self.http.fetch_json(ProviderId::AbuseIpDb, request).await
    }

    /// Fetch and render as WHOIS text
    pub async fn whois_text(&self, ip: &str) -> Result<String, ProviderError> {
        let rdap = self.lookup_ip(ip).await?;
        Ok(format_rdap_to_whois(&rdap))
    }
}
