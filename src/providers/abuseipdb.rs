//! AbuseIPDB v2 provider

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::models::ioc_utils::is_ipv4;
use crate::providers::{HttpFetcher, Provider, ProviderId, endpoint};
use crate::whois::RdapClient;

/// AbuseIPDB provider.
///
/// AbuseIPDB has no WHOIS of its own, so successful checks are enriched with
/// ARIN RDAP data rendered as WHOIS text under `data.whois`.
pub struct AbuseIpDbProvider {
    http: HttpFetcher,
    base_url: String,
    rdap: RdapClient,
}

impl AbuseIpDbProvider {
    pub fn new(http: HttpFetcher, base_url: &str, rdap: RdapClient) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            rdap,
        }
    }

    /// Check an IP address against AbuseIPDB
    pub async fn check_ip(&self, ip: &str, key: &str) -> Result<Value, ProviderError> {
        let url = endpoint(ProviderId::AbuseIpDb, &self.base_url, &["check"])?;
        let request = self
            .http
            .client()
            .get(url)
            .header("Key", key)
            .query(&[
                ("ipAddress", ip),
                ("maxAgeInDays", "90"),
                ("verbose", "true"),
            ]);

        self.http.fetch_json(ProviderId::AbuseIpDb, request).await
    }
}

#[async_trait]
impl Provider for AbuseIpDbProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AbuseIpDb
    }

    async fn lookup(&self, ip: &str, key: &str) -> Result<Value, ProviderError> {
        let mut result = self.check_ip(ip, key).await?;

        if !is_ipv4(ip) {
            return Ok(result);
        }

        match self.rdap.whois_text(ip).await {
            Ok(whois) => {
                if let Some(data) = result.get_mut("data").and_then(Value::as_object_mut) {
                    if !whois.is_empty() {
                        data.insert("whois".to_string(), Value::String(whois));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = "abuseipdb",
                    indicator = %ip,
                    error = %e,
                    "RDAP enrichment failed"
                );
            }
        }

        Ok(result)
    }
}
