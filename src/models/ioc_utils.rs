// src/models/ioc_utils.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::models::IocType;

static IPV4_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").expect("valid ipv4 regex"));

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid domain regex"));

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("valid scheme regex"));

/// Classify an indicator string.
///
/// Dotted quads are IPv4 without any octet range check, so `999.999.999.999`
/// is still an IPv4 indicator. Anything that is neither IPv4, a domain, nor
/// scheme-prefixed is treated as a file hash.
pub fn classify(value: &str) -> IocType {
    if IPV4_RE.is_match(value) {
        IocType::Ipv4
    } else if DOMAIN_RE.is_match(value) {
        IocType::Domain
    } else if SCHEME_RE.is_match(value) {
        IocType::Url
    } else {
        IocType::Hash
    }
}

/// True when the value looks like a dotted-quad IPv4 address
pub fn is_ipv4(value: &str) -> bool {
    IPV4_RE.is_match(value)
}
