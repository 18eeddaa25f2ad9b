//! Threat-intelligence provider clients

pub mod abuseipdb;
pub mod alienvault;
pub mod greynoise;
pub mod ipqualityscore;
pub mod placeholder;
pub mod securitytrails;
pub mod shodan;
pub mod virustotal;
pub mod xforce;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::{ApiKeys, Settings};
use crate::error::ProviderError;
use crate::models::InputKind;
use crate::whois::RdapClient;

use abuseipdb::AbuseIpDbProvider;
use alienvault::AlienVaultProvider;
use greynoise::GreyNoiseProvider;
use ipqualityscore::IpQualityScoreProvider;
use securitytrails::SecurityTrailsProvider;
use shodan::ShodanProvider;
use virustotal::VirusTotalProvider;
use xforce::XForceProvider;

/// Every provider the dashboard knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    VirusTotal,
    AbuseIpDb,
    SecurityTrails,
    GreyNoise,
    Shodan,
    AlienVault,
    IpQualityScore,
    CiscoTalos,
    XForce,
    GoogleSafeBrowsing,
    ApiVoid,
    WhoisXml,
    Spamhaus,
    Neutrino,
    ThreatMiner,
    FraudGuard,
    Zscaler,
    Webroot,
    RiskIq,
}

impl ProviderId {
    pub const ALL: [ProviderId; 19] = [
        ProviderId::VirusTotal,
        ProviderId::AbuseIpDb,
        ProviderId::SecurityTrails,
        ProviderId::GreyNoise,
        ProviderId::Shodan,
        ProviderId::AlienVault,
        ProviderId::IpQualityScore,
        ProviderId::CiscoTalos,
        ProviderId::XForce,
        ProviderId::GoogleSafeBrowsing,
        ProviderId::ApiVoid,
        ProviderId::WhoisXml,
        ProviderId::Spamhaus,
        ProviderId::Neutrino,
        ProviderId::ThreatMiner,
        ProviderId::FraudGuard,
        ProviderId::Zscaler,
        ProviderId::Webroot,
        ProviderId::RiskIq,
    ];

    /// Stable id used in keys, reports and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::VirusTotal => "virustotal",
            ProviderId::AbuseIpDb => "abuseipdb",
            ProviderId::SecurityTrails => "securitytrails",
            ProviderId::GreyNoise => "greynoise",
            ProviderId::Shodan => "shodan",
            ProviderId::AlienVault => "alienvault",
            ProviderId::IpQualityScore => "ipqualityscore",
            ProviderId::CiscoTalos => "ciscotalos",
            ProviderId::XForce => "xforce",
            ProviderId::GoogleSafeBrowsing => "googlesafebrowsing",
            ProviderId::ApiVoid => "apivoid",
            ProviderId::WhoisXml => "whoisxml",
            ProviderId::Spamhaus => "spamhaus",
            ProviderId::Neutrino => "neutrino",
            ProviderId::ThreatMiner => "threatminer",
            ProviderId::FraudGuard => "fraudguard",
            ProviderId::Zscaler => "zscaler",
            ProviderId::Webroot => "webroot",
            ProviderId::RiskIq => "riskiq",
        }
    }

    /// Human-readable vendor name, used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::VirusTotal => "VirusTotal",
            ProviderId::AbuseIpDb => "AbuseIPDB",
            ProviderId::SecurityTrails => "SecurityTrails",
            ProviderId::GreyNoise => "GreyNoise",
            ProviderId::Shodan => "Shodan",
            ProviderId::AlienVault => "AlienVault OTX",
            ProviderId::IpQualityScore => "IPQualityScore",
            ProviderId::CiscoTalos => "Cisco Talos",
            ProviderId::XForce => "IBM X-Force",
            ProviderId::GoogleSafeBrowsing => "Google Safe Browsing",
            ProviderId::ApiVoid => "APIVoid",
            ProviderId::WhoisXml => "WhoisXML API",
            ProviderId::Spamhaus => "Spamhaus",
            ProviderId::Neutrino => "Neutrino API",
            ProviderId::ThreatMiner => "ThreatMiner",
            ProviderId::FraudGuard => "FraudGuard",
            ProviderId::Zscaler => "Zscaler",
            ProviderId::Webroot => "Webroot BrightCloud",
            ProviderId::RiskIq => "RiskIQ PassiveTotal",
        }
    }

    pub fn input_kind(&self) -> InputKind {
        match self {
            ProviderId::AbuseIpDb
            | ProviderId::GreyNoise
            | ProviderId::IpQualityScore
            | ProviderId::Neutrino
            | ProviderId::FraudGuard => InputKind::IpAddress,
            ProviderId::Shodan => InputKind::Query,
            _ => InputKind::Resource,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProviderId::VirusTotal => {
                "Reputation and analysis of files, domains, IPs, and URLs, with detailed stats."
            }
            ProviderId::AbuseIpDb => {
                "IP abuse confidence score, report counts, and network context. IP addresses only."
            }
            ProviderId::SecurityTrails => {
                "Primary WHOIS provider with full registrant data, plus DNS and infrastructure intel."
            }
            ProviderId::GreyNoise => {
                "Internet noise and mass-scan intelligence. Excludes WHOIS. IP addresses only."
            }
            ProviderId::Shodan => {
                "Search for internet-connected devices, open ports, services, and vulnerabilities."
            }
            ProviderId::AlienVault => {
                "WHOIS data combined with threat pulses, reputation, and passive DNS."
            }
            ProviderId::IpQualityScore => "Fraud scoring, proxy and VPN detection for IP addresses.",
            ProviderId::XForce => "IBM threat intelligence for IPs, URLs, and malware hashes.",
            _ => "Placeholder integration returning sample data.",
        }
    }

    pub fn documentation_url(&self) -> &'static str {
        match self {
            ProviderId::VirusTotal => "https://developers.virustotal.com/reference/overview",
            ProviderId::AbuseIpDb => "https://docs.abuseipdb.com/",
            ProviderId::SecurityTrails => "https://docs.securitytrails.com/docs",
            ProviderId::GreyNoise => "https://docs.greynoise.io/",
            ProviderId::Shodan => "https://developer.shodan.io/",
            ProviderId::AlienVault => "https://otx.alienvault.com/api",
            ProviderId::IpQualityScore => "https://www.ipqualityscore.com/documentation/overview",
            ProviderId::CiscoTalos => "https://talosintelligence.com/",
            ProviderId::XForce => "https://api.xforce.ibmcloud.com/doc/",
            ProviderId::GoogleSafeBrowsing => "https://developers.google.com/safe-browsing/v4",
            ProviderId::ApiVoid => "https://docs.apivoid.com/",
            ProviderId::WhoisXml => "https://whois.whoisxmlapi.com/documentation/making-requests",
            ProviderId::Spamhaus => "https://docs.spamhaus.com/",
            ProviderId::Neutrino => "https://www.neutrinoapi.com/api/api-basics/",
            ProviderId::ThreatMiner => "https://www.threatminer.org/api.php",
            ProviderId::FraudGuard => "https://docs.fraudguard.io/",
            ProviderId::Zscaler => "https://help.zscaler.com/zia/api",
            ProviderId::Webroot => "https://www.brightcloud.com/",
            ProviderId::RiskIq => "https://api.riskiq.net/api/",
        }
    }

    /// Environment variable holding the default key, e.g. `VIRUSTOTAL_API_KEY`
    pub fn env_var(&self) -> String {
        format!("{}_API_KEY", self.as_str().to_uppercase())
    }

    /// ThreatMiner is a public API; every other provider needs a key
    pub fn requires_key(&self) -> bool {
        !matches!(self, ProviderId::ThreatMiner)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown service: {s}"))
    }
}

/// Catalog entry describing a provider to callers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub id: ProviderId,
    pub name: &'static str,
    pub input_type: InputKind,
    pub description: &'static str,
    pub documentation_url: &'static str,
    pub live: bool,
}

/// Trait implemented by every provider client
#[async_trait]
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// False for placeholders that never touch the network
    fn is_live(&self) -> bool {
        true
    }

    /// Look up `input` with the already-resolved `key`
    async fn lookup(&self, input: &str, key: &str) -> Result<Value, ProviderError>;
}

/// Shared HTTP plumbing for provider clients
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("zeroshark/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Run one request future under the fetcher's timeout
    async fn bounded<T>(
        &self,
        id: ProviderId,
        request: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.timeout, request)
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::Timeout {
                    provider: id.display_name(),
                    secs: self.timeout.as_secs(),
                })
            })
    }

    async fn send(
        &self,
        id: ProviderId,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(id.display_name(), self.timeout.as_secs(), e))
    }

    /// Send a request and decode a 2xx JSON body.
    ///
    /// Non-2xx becomes `VendorHttp` with a message taken from the vendor body
    /// when one can be found. Each call runs under its own timeout.
    pub async fn fetch_json(
        &self,
        id: ProviderId,
        request: RequestBuilder,
    ) -> Result<Value, ProviderError> {
        self.bounded(id, async {
            let response = self.send(id, request).await?;
            let status = response.status();

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(vendor_error(id, status.as_u16(), &body));
            }

            response
                .json()
                .await
                .map_err(|e| ProviderError::from_reqwest(id.display_name(), self.timeout.as_secs(), e))
        })
        .await
    }

    /// Send a request and return the raw 2xx body
    pub async fn fetch_text(
        &self,
        id: ProviderId,
        request: RequestBuilder,
    ) -> Result<String, ProviderError> {
        self.bounded(id, async {
            let response = self.send(id, request).await?;
            let status = response.status();

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(vendor_error(id, status.as_u16(), &body));
            }

            response
                .text()
                .await
                .map_err(|e| ProviderError::from_reqwest(id.display_name(), self.timeout.as_secs(), e))
        })
        .await
    }

    /// Secondary enrichment call. Failures are logged and swallowed.
    pub async fn fetch_optional(
        &self,
        id: ProviderId,
        what: &'static str,
        request: RequestBuilder,
    ) -> Option<Value> {
        match self.fetch_json(id, request).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    provider = id.as_str(),
                    enrichment = what,
                    error = %e,
                    "Secondary lookup failed"
                );
                None
            }
        }
    }
}

/// Build the error for a non-2xx vendor response
fn vendor_error(id: ProviderId, status: u16, body: &str) -> ProviderError {
    let generic = format!("{} API error! status: {}", id.display_name(), status);
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_body = parsed.as_ref().and_then(|v| vendor_message(id, v));

    let message = match id {
        ProviderId::XForce if !body.trim().is_empty() => format!("{} - {}", generic, body.trim()),
        _ => from_body.unwrap_or(generic),
    };

    ProviderError::VendorHttp {
        provider: id.display_name(),
        status,
        message,
    }
}

/// Where each vendor puts a human-readable error
fn vendor_message(id: ProviderId, body: &Value) -> Option<String> {
    let message = match id {
        ProviderId::VirusTotal => body.pointer("/error/message"),
        ProviderId::AbuseIpDb => body.pointer("/errors/0/detail"),
        ProviderId::SecurityTrails | ProviderId::IpQualityScore | ProviderId::GreyNoise => {
            body.get("message")
        }
        ProviderId::Shodan => body.get("error"),
        ProviderId::AlienVault => body.get("detail"),
        _ => None,
    };

    message
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Join `segments` onto `base` as percent-encoded path segments.
///
/// An indicator holding `/`, `?` or `#` stays inside its own segment.
pub(crate) fn endpoint(
    id: ProviderId,
    base: &str,
    segments: &[&str],
) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base).map_err(|e| {
        ProviderError::InvalidInput(format!("Invalid {} base URL: {e}", id.display_name()))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            ProviderError::InvalidInput(format!("{} base URL cannot be a base", id.display_name()))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// All provider clients, dispatched by `ProviderId`
pub struct ProviderRegistry {
    virustotal: VirusTotalProvider,
    abuseipdb: AbuseIpDbProvider,
    securitytrails: SecurityTrailsProvider,
    greynoise: GreyNoiseProvider,
    shodan: ShodanProvider,
    alienvault: AlienVaultProvider,
    ipqualityscore: IpQualityScoreProvider,
    xforce: XForceProvider,
}

impl ProviderRegistry {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let http = HttpFetcher::new(settings.timeout)?;
        let endpoints = &settings.endpoints;
        let rdap = RdapClient::new(http.clone(), &endpoints.rdap);

        Ok(Self {
            virustotal: VirusTotalProvider::new(http.clone(), &endpoints.virustotal),
            abuseipdb: AbuseIpDbProvider::new(http.clone(), &endpoints.abuseipdb, rdap),
            securitytrails: SecurityTrailsProvider::new(http.clone(), &endpoints.securitytrails),
            greynoise: GreyNoiseProvider::new(http.clone(), &endpoints.greynoise),
            shodan: ShodanProvider::new(http.clone(), &endpoints.shodan),
            alienvault: AlienVaultProvider::new(http.clone(), &endpoints.alienvault),
            ipqualityscore: IpQualityScoreProvider::new(http.clone(), &endpoints.ipqualityscore),
            xforce: XForceProvider::new(http, &endpoints.xforce),
        })
    }

    pub fn get(&self, id: ProviderId) -> &dyn Provider {
        match id {
            ProviderId::VirusTotal => &self.virustotal,
            ProviderId::AbuseIpDb => &self.abuseipdb,
            ProviderId::SecurityTrails => &self.securitytrails,
            ProviderId::GreyNoise => &self.greynoise,
            ProviderId::Shodan => &self.shodan,
            ProviderId::AlienVault => &self.alienvault,
            ProviderId::IpQualityScore => &self.ipqualityscore,
            ProviderId::XForce => &self.xforce,
            ProviderId::CiscoTalos => &placeholder::CISCO_TALOS,
            ProviderId::GoogleSafeBrowsing => &placeholder::GOOGLE_SAFE_BROWSING,
            ProviderId::ApiVoid => &placeholder::API_VOID,
            ProviderId::WhoisXml => &placeholder::WHOIS_XML,
            ProviderId::Spamhaus => &placeholder::SPAMHAUS,
            ProviderId::Neutrino => &placeholder::NEUTRINO,
            ProviderId::ThreatMiner => &placeholder::THREAT_MINER,
            ProviderId::FraudGuard => &placeholder::FRAUD_GUARD,
            ProviderId::Zscaler => &placeholder::ZSCALER,
            ProviderId::Webroot => &placeholder::WEBROOT,
            ProviderId::RiskIq => &placeholder::RISK_IQ,
        }
    }

    pub fn catalog(&self) -> Vec<ServiceInfo> {
        ProviderId::ALL
            .into_iter()
            .map(|id| {
                let provider = self.get(id);
                ServiceInfo {
                    id: provider.id(),
                    name: id.display_name(),
                    input_type: id.input_kind(),
                    description: id.description(),
                    documentation_url: id.documentation_url(),
                    live: provider.is_live(),
                }
            })
            .collect()
    }

    /// Resolve the key and run one provider lookup
    pub async fn call(
        &self,
        id: ProviderId,
        input: &str,
        keys: &ApiKeys,
    ) -> Result<Value, ProviderError> {
        let key = match keys.get(id) {
            Some(key) => key,
            None if !id.requires_key() => "",
            None => {
                return Err(ProviderError::MissingKey {
                    provider: id.display_name(),
                });
            }
        };

        let input = input.trim();
        if input.is_empty() {
            return Err(ProviderError::InvalidInput(
                "Please enter a value to search.".into(),
            ));
        }

        tracing::debug!(provider = id.as_str(), indicator = %input, "Calling provider");

        self.get(id).lookup(input, key).await
    }
}
