//! Error types shared by provider clients and the report pipeline

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::ProviderOutcome;

/// Failure of a single provider call
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No credential configured for the provider; the call was never made.
    #[error("{provider} API key is not provided or configured.")]
    MissingKey { provider: &'static str },

    /// Non-2xx response from the vendor.
    #[error("{message}")]
    VendorHttp {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Transport failure (DNS, connection reset, TLS).
    #[error("Failed to reach {provider}: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The vendor did not answer within the configured timeout.
    #[error("{provider} did not respond within {secs}s")]
    Timeout { provider: &'static str, secs: u64 },

    /// Input the provider cannot look up.
    #[error("{0}")]
    InvalidInput(String),

    /// Vendor answered 2xx with a body we could not decode.
    #[error("Failed to parse {provider} response: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    /// Classify a reqwest failure into timeout, decode or network
    pub fn from_reqwest(provider: &'static str, secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider, secs }
        } else if err.is_decode() {
            ProviderError::Decode {
                provider,
                source: err,
            }
        } else {
            ProviderError::Network {
                provider,
                source: err,
            }
        }
    }
}

/// Failure of a whole report request
#[derive(Error, Debug)]
pub enum ReportError {
    /// Empty indicator or empty provider selection.
    #[error("Invalid report request: {0}")]
    InvalidRequest(String),

    /// The summary step failed. Provider data collected so far is kept.
    #[error("Report generation failed: {message}")]
    GenerationFailed {
        message: String,
        raw_data: BTreeMap<String, ProviderOutcome>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_error_displays_vendor_message_verbatim() {
        let err = ProviderError::VendorHttp {
            provider: "Shodan",
            status: 401,
            message: "Shodan API error! status: 401".into(),
        };
        assert_eq!(err.to_string(), "Shodan API error! status: 401");
    }

    #[test]
    fn missing_key_names_provider() {
        let err = ProviderError::MissingKey {
            provider: "GreyNoise",
        };
        assert_eq!(
            err.to_string(),
            "GreyNoise API key is not provided or configured."
        );
    }
}
