//! Placeholder providers with no live integration

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::providers::{Provider, ProviderId};

/// A provider that only checks the key was supplied and returns sample data.
///
/// Payloads always carry `"implemented": false` so callers can tell them
/// apart from real vendor responses.
pub struct Placeholder {
    id: ProviderId,
}

impl Placeholder {
    pub const fn new(id: ProviderId) -> Self {
        Self { id }
    }

    fn sample(&self, resource: &str) -> Value {
        match self.id {
            ProviderId::CiscoTalos => json!({
                "resource": resource,
                "reputation": { "level": "Neutral", "score": 50 },
            }),
            ProviderId::GoogleSafeBrowsing => json!({
                "resource": resource,
                "matches": [],
            }),
            ProviderId::ApiVoid => json!({
                "resource": resource,
                "data": {
                    "reputation": {
                        "risk_score": { "result": 0 },
                        "blacklists": { "detections": 0 },
                    },
                },
            }),
            ProviderId::WhoisXml => json!({
                "resource": resource,
                "WhoisRecord": { "registrarName": "Mock Registrar" },
            }),
            ProviderId::Spamhaus => json!({
                "resource": resource,
                "lookup": { "listed": false, "blocklists": [] },
            }),
            ProviderId::Neutrino => json!({
                "ip": resource,
                "isProxy": false,
                "isVpn": false,
                "isTor": false,
            }),
            ProviderId::ThreatMiner => json!({
                "resource": resource,
                "results": [],
            }),
            ProviderId::FraudGuard => json!({
                "ip": resource,
                "risk_level": "low",
                "proxy": "NO",
            }),
            ProviderId::Zscaler => json!({
                "resource": resource,
                "category": "Benign",
            }),
            ProviderId::Webroot => json!({
                "resource": resource,
                "reputation": 20,
            }),
            ProviderId::RiskIq => json!({
                "resource": resource,
                "results": { "passive_dns": [], "whois": {} },
            }),
            _ => json!({ "resource": resource }),
        }
    }
}

pub static CISCO_TALOS: Placeholder = Placeholder::new(ProviderId::CiscoTalos);
pub static GOOGLE_SAFE_BROWSING: Placeholder = Placeholder::new(ProviderId::GoogleSafeBrowsing);
pub static API_VOID: Placeholder = Placeholder::new(ProviderId::ApiVoid);
pub static WHOIS_XML: Placeholder = Placeholder::new(ProviderId::WhoisXml);
pub static SPAMHAUS: Placeholder = Placeholder::new(ProviderId::Spamhaus);
pub static NEUTRINO: Placeholder = Placeholder::new(ProviderId::Neutrino);
pub static THREAT_MINER: Placeholder = Placeholder::new(ProviderId::ThreatMiner);
pub static FRAUD_GUARD: Placeholder = Placeholder::new(ProviderId::FraudGuard);
pub static ZSCALER: Placeholder = Placeholder::new(ProviderId::Zscaler);
pub static WEBROOT: Placeholder = Placeholder::new(ProviderId::Webroot);
pub static RISK_IQ: Placeholder = Placeholder::new(ProviderId::RiskIq);

#[async_trait]
impl Provider for Placeholder {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn is_live(&self) -> bool {
        false
    }

    async fn lookup(&self, resource: &str, _key: &str) -> Result<Value, ProviderError> {
        tracing::info!(provider = self.id.as_str(), indicator = %resource, "Placeholder lookup");

        let mut payload = self.sample(resource);
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("implemented".to_string(), Value::Bool(false));
            obj.insert(
                "note".to_string(),
                Value::String(format!(
                    "This is mock data. {} integration is not fully implemented.",
                    self.id.display_name()
                )),
            );
        }
        Ok(payload)
    }
}
