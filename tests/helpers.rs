// Shared helpers for the vendor mock-server tests.

use std::time::Duration;

use wiremock::MockServer;

use zeroshark::config::{ApiKeys, Endpoints, Settings};
use zeroshark::providers::{ProviderId, ProviderRegistry};

/// Registry whose every vendor points at the mock server
#[allow(dead_code)] // Used by other test files
pub fn registry_for(server: &MockServer) -> ProviderRegistry {
    registry_with_timeout(server, Duration::from_secs(5))
}

#[allow(dead_code)] // Used by other test files
pub fn registry_with_timeout(server: &MockServer, timeout: Duration) -> ProviderRegistry {
    let settings = Settings {
        endpoints: Endpoints::all(&server.uri()),
        timeout,
    };
    ProviderRegistry::new(&settings).expect("Failed to build registry")
}

/// Keys for the given providers
#[allow(dead_code)] // Used by other test files
pub fn keys(pairs: &[(ProviderId, &str)]) -> ApiKeys {
    pairs
        .iter()
        .fold(ApiKeys::new(), |keys, (id, key)| keys.with(*id, *key))
}

#[allow(dead_code)] // Used by other test files
pub fn services(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}
