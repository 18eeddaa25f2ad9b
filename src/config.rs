//! Runtime configuration: vendor base URLs, timeouts, and API keys

use std::collections::BTreeMap;
use std::time::Duration;

use crate::providers::ProviderId;

/// Default per-call timeout for vendor requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base URLs for every vendor API the crate talks to.
///
/// Overridable so tests can point all providers at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub virustotal: String,
    pub abuseipdb: String,
    pub securitytrails: String,
    pub greynoise: String,
    pub shodan: String,
    pub alienvault: String,
    pub ipqualityscore: String,
    pub xforce: String,
    pub rdap: String,
    pub gemini: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            virustotal: "https://www.virustotal.com/api/v3".into(),
            abuseipdb: "https://api.abuseipdb.com/api/v2".into(),
            securitytrails: "https://api.securitytrails.com/v1".into(),
            greynoise: "https://api.greynoise.io".into(),
            shodan: "https://api.shodan.io".into(),
            alienvault: "https://otx.alienvault.com/api/v1".into(),
            ipqualityscore: "https://ipqualityscore.com/api/json".into(),
            xforce: "https://api.xforce.ibmcloud.com".into(),
            rdap: "https://rdap.arin.net/registry".into(),
            gemini: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

impl Endpoints {
    /// Point every vendor at the same base URL
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            virustotal: base.clone(),
            abuseipdb: base.clone(),
            securitytrails: base.clone(),
            greynoise: base.clone(),
            shodan: base.clone(),
            alienvault: base.clone(),
            ipqualityscore: base.clone(),
            xforce: base.clone(),
            rdap: base.clone(),
            gemini: base,
        }
    }
}

/// Provider client settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// API keys per provider.
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    keys: BTreeMap<ProviderId, String>,
}

impl ApiKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `<ID>_API_KEY` for every provider from the environment
    pub fn from_env() -> Self {
        let mut keys = Self::new();
        for id in ProviderId::ALL {
            if let Ok(value) = std::env::var(id.env_var()) {
                keys.insert(id, value);
            }
        }
        keys
    }

    /// Build from a string-keyed map, skipping ids we don't know
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let mut keys = Self::new();
        for (name, value) in map {
            match name.parse::<ProviderId>() {
                Ok(id) => keys.insert(id, value.clone()),
                Err(_) => tracing::debug!(service = %name, "Ignoring key for unknown service"),
            }
        }
        keys
    }

    pub fn with(mut self, id: ProviderId, key: impl Into<String>) -> Self {
        self.insert(id, key);
        self
    }

    pub fn insert(&mut self, id: ProviderId, key: impl Into<String>) {
        let key = key.into();
        if key.trim().is_empty() {
            self.keys.remove(&id);
        } else {
            self.keys.insert(id, key);
        }
    }

    pub fn remove(&mut self, id: ProviderId) -> Option<String> {
        self.keys.remove(&id)
    }

    pub fn get(&self, id: ProviderId) -> Option<&str> {
        self.keys.get(&id).map(String::as_str)
    }

    /// Keys from `self` win; `fallback` fills in the rest
    pub fn merged_over(&self, fallback: &ApiKeys) -> ApiKeys {
        let mut keys = fallback.keys.clone();
        keys.extend(self.keys.iter().map(|(id, k)| (*id, k.clone())));
        ApiKeys { keys }
    }

    pub fn configured(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.keys.keys().copied()
    }
}
