//! Provider clients against mocked vendor APIs.

use std::time::Duration;

use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zeroshark::error::ProviderError;
use zeroshark::providers::ProviderId;

#[path = "helpers.rs"]
mod helpers;

use helpers::{keys, registry_for, registry_with_timeout};

#[tokio::test]
async fn virustotal_splices_whois_and_omits_failed_secondaries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip_addresses/8.8.8.8"))
        .and(header("x-apikey", "vt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "8.8.8.8",
                "attributes": { "last_analysis_stats": { "malicious": 2, "suspicious": 1 } }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip_addresses/8.8.8.8/whois"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "attributes": { "whois": "NetName: GOOGLE" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip_addresses/8.8.8.8/resolutions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let data = registry
        .call(ProviderId::VirusTotal, "8.8.8.8", &keys(&[(ProviderId::VirusTotal, "vt-key")]))
        .await
        .unwrap();

    let attrs = &data["data"]["attributes"];
    assert_eq!(attrs["whois"], "NetName: GOOGLE");
    assert!(attrs.get("resolutions").is_none());
    assert!(attrs.get("subdomains").is_none());
    assert_eq!(attrs["last_analysis_stats"]["malicious"], 2);
}

#[tokio::test]
async fn virustotal_error_message_comes_from_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/domains/example.com"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "WrongCredentialsError", "message": "Wrong API key" }
        })))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .call(ProviderId::VirusTotal, "example.com", &keys(&[(ProviderId::VirusTotal, "bad")]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::VendorHttp { status: 401, .. }));
    assert_eq!(err.to_string(), "Wrong API key");
}

#[tokio::test]
async fn abuseipdb_adds_rdap_whois_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/check"))
        .and(query_param("ipAddress", "8.8.8.8"))
        .and(query_param("maxAgeInDays", "90"))
        .and(query_param("verbose", "true"))
        .and(header("Key", "abuse-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "ipAddress": "8.8.8.8", "abuseConfidenceScore": 0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "GOOGLE",
            "handle": "NET-8-8-8-0-1",
        })))
        .mount(&server)
        .await;

    let data = registry_for(&server)
        .call(ProviderId::AbuseIpDb, "8.8.8.8", &keys(&[(ProviderId::AbuseIpDb, "abuse-key")]))
        .await
        .unwrap();

    assert_eq!(data["data"]["abuseConfidenceScore"], 0);
    assert_eq!(
        data["data"]["whois"],
        "NetName:          GOOGLE\nNetHandle:        NET-8-8-8-0-1"
    );
}

#[tokio::test]
async fn abuseipdb_survives_rdap_outage() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "ipAddress": "1.1.1.1" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/1.1.1.1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let data = registry_for(&server)
        .call(ProviderId::AbuseIpDb, "1.1.1.1", &keys(&[(ProviderId::AbuseIpDb, "k")]))
        .await
        .unwrap();

    assert_eq!(data, json!({ "data": { "ipAddress": "1.1.1.1" } }));
}

#[tokio::test]
async fn abuseipdb_error_detail_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{ "detail": "The ip address must be a valid IPv4 or IPv6 address.", "status": 422 }]
        })))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .call(ProviderId::AbuseIpDb, "not-an-ip", &keys(&[(ProviderId::AbuseIpDb, "k")]))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "The ip address must be a valid IPv4 or IPv6 address.");
}

#[tokio::test]
async fn greynoise_and_alienvault_treat_404_as_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/community/10.0.0.1"))
        .and(header("key", "gn"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/indicators/IPv4/10.0.0.1/general"))
        .and(header("X-OTX-API-KEY", "otx"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let keys = keys(&[(ProviderId::GreyNoise, "gn"), (ProviderId::AlienVault, "otx")]);

    let greynoise = assert_ok!(registry.call(ProviderId::GreyNoise, "10.0.0.1", &keys).await);
    assert_eq!(
        greynoise,
        json!({ "message": "This IP address was not found in the GreyNoise dataset." })
    );

    let otx = assert_ok!(registry.call(ProviderId::AlienVault, "10.0.0.1", &keys).await);
    assert_eq!(
        otx,
        json!({ "message": "10.0.0.1 was not found in AlienVault OTX." })
    );
}

#[tokio::test]
async fn alienvault_domain_pulls_whois_link_and_passive_dns() {
    let server = MockServer::start().await;
    let whois_link = format!("{}/whois/example.com", server.uri());

    Mock::given(method("GET"))
        .and(path("/indicators/domain/example.com/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "indicator": "example.com",
            "pulse_info": { "count": 0 },
            "whois": whois_link,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/whois/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Domain Name: EXAMPLE.COM"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/indicators/domain/example.com/passive_dns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "passive_dns": [{ "address": "93.184.216.34" }]
        })))
        .mount(&server)
        .await;

    let data = registry_for(&server)
        .call(ProviderId::AlienVault, "example.com", &keys(&[(ProviderId::AlienVault, "otx")]))
        .await
        .unwrap();

    assert_eq!(data["whois_data"], "Domain Name: EXAMPLE.COM");
    assert_eq!(data["passive_dns"]["passive_dns"][0]["address"], "93.184.216.34");
}

#[tokio::test]
async fn securitytrails_domain_enrichment_and_unsupported_ip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/domain/example.com"))
        .and(header("APIKEY", "st"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hostname": "example.com" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domain/example.com/whois"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "registrarName": "RESERVED-IANA" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domain/example.com/subdomains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "subdomains": ["www", "mail"] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/8.8.8.8/domains"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let keys = keys(&[(ProviderId::SecurityTrails, "st")]);

    let domain = registry
        .call(ProviderId::SecurityTrails, "example.com", &keys)
        .await
        .unwrap();
    assert_eq!(domain["whois"]["registrarName"], "RESERVED-IANA");
    assert_eq!(domain["subdomains"], json!(["www", "mail"]));

    let ip = registry
        .call(ProviderId::SecurityTrails, "8.8.8.8", &keys)
        .await
        .unwrap();
    assert_eq!(ip["status"], "unsupported_lookup");
    assert_eq!(
        ip["message"],
        "SecurityTrails does not support this lookup type for: 8.8.8.8"
    );
}

#[tokio::test]
async fn shodan_searches_non_ip_queries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shodan/host/search"))
        .and(query_param("key", "sh"))
        .and(query_param("query", "apache country:DE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 3, "matches": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shodan/host/9.9.9.9"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid API key" })))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let keys = keys(&[(ProviderId::Shodan, "sh")]);

    let search = registry
        .call(ProviderId::Shodan, "apache country:DE", &keys)
        .await
        .unwrap();
    assert_eq!(search["total"], 3);

    let err = registry
        .call(ProviderId::Shodan, "9.9.9.9", &keys)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid API key");
}

#[tokio::test]
async fn ipqualityscore_keeps_key_in_path_and_rejects_non_ips() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip/ipqs-key/1.2.3.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "fraud_score": 87 })))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let keys = keys(&[(ProviderId::IpQualityScore, "ipqs-key")]);

    let data = registry
        .call(ProviderId::IpQualityScore, "1.2.3.4", &keys)
        .await
        .unwrap();
    assert_eq!(data["fraud_score"], 87);

    let err = registry
        .call(ProviderId::IpQualityScore, "example.com", &keys)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidInput(_)));
    assert_eq!(err.to_string(), "Invalid IP address format provided.");
}

#[tokio::test]
async fn xforce_uses_basic_auth_and_appends_error_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ipr/1.2.3.4"))
        .and(header("Authorization", "Basic a2V5OnBhc3M="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "1.2.3.4", "score": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/malware/44d88612fea8a8f36de82e1278abb02f"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let keys = keys(&[(ProviderId::XForce, "key:pass")]);

    let data = registry.call(ProviderId::XForce, "1.2.3.4", &keys).await.unwrap();
    assert_eq!(data["score"], 1);

    let err = registry
        .call(ProviderId::XForce, "44d88612fea8a8f36de82e1278abb02f", &keys)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "IBM X-Force API error! status: 404 - Not Found");
}

#[tokio::test]
async fn slow_vendor_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/community/8.8.4.4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "noise": false }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let registry = registry_with_timeout(&server, Duration::from_secs(1));
    let err = registry
        .call(ProviderId::GreyNoise, "8.8.4.4", &keys(&[(ProviderId::GreyNoise, "gn")]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Timeout { secs: 1, .. }));
    assert_eq!(err.to_string(), "GreyNoise did not respond within 1s");
}

#[tokio::test]
async fn abuseipdb_keeps_data_when_rdap_is_slow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/check"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "ipAddress": "1.1.1.1", "abuseConfidenceScore": 0 } }))
                .set_delay(Duration::from_millis(1200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/1.1.1.1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "APNIC-LABS" }))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let registry = registry_with_timeout(&server, Duration::from_secs(2));
    let data = assert_ok!(
        registry
            .call(ProviderId::AbuseIpDb, "1.1.1.1", &keys(&[(ProviderId::AbuseIpDb, "k")]))
            .await
    );

    assert_eq!(
        data,
        json!({ "data": { "ipAddress": "1.1.1.1", "abuseConfidenceScore": 0 } })
    );
}

#[tokio::test]
async fn primary_and_enrichment_each_get_the_full_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/check"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "ipAddress": "1.1.1.1" } }))
                .set_delay(Duration::from_millis(1200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/1.1.1.1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "APNIC-LABS" }))
                .set_delay(Duration::from_millis(1200)),
        )
        .mount(&server)
        .await;

    let registry = registry_with_timeout(&server, Duration::from_secs(2));
    let data = assert_ok!(
        registry
            .call(ProviderId::AbuseIpDb, "1.1.1.1", &keys(&[(ProviderId::AbuseIpDb, "k")]))
            .await
    );

    assert_eq!(data["data"]["whois"], "NetName:          APNIC-LABS");
}

#[tokio::test]
async fn virustotal_drops_only_the_slow_secondary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/domains/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "example.com", "attributes": { "reputation": 0 } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domains/example.com/whois"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "attributes": { "whois": "Domain Name: EXAMPLE.COM" } } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domains/example.com/subdomains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "www.example.com" }]
        })))
        .mount(&server)
        .await;

    let registry = registry_with_timeout(&server, Duration::from_secs(1));
    let data = assert_ok!(
        registry
            .call(ProviderId::VirusTotal, "example.com", &keys(&[(ProviderId::VirusTotal, "vt")]))
            .await
    );

    let attrs = &data["data"]["attributes"];
    assert_eq!(attrs["reputation"], 0);
    assert!(attrs.get("whois").is_none());
    assert_eq!(attrs["subdomains"], json!([{ "id": "www.example.com" }]));
}

#[tokio::test]
async fn reserved_characters_in_indicators_stay_in_one_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/abc%2Fdef%3Fx%23y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "abc/def?x#y", "attributes": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domain/evil.example%2F..%2Fip"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let vt = assert_ok!(
        registry
            .call(ProviderId::VirusTotal, "abc/def?x#y", &keys(&[(ProviderId::VirusTotal, "vt")]))
            .await
    );
    assert_eq!(vt["data"]["id"], "abc/def?x#y");

    let st = assert_ok!(
        registry
            .call(
                ProviderId::SecurityTrails,
                "evil.example/../ip",
                &keys(&[(ProviderId::SecurityTrails, "st")])
            )
            .await
    );
    assert_eq!(st["status"], "unsupported_lookup");

    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.url.query().is_none()));
}

#[tokio::test]
async fn repeated_calls_against_fixed_fixture_are_identical() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/community/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "8.8.8.8", "noise": false, "riot": true, "name": "Google Public DNS"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let keys = keys(&[(ProviderId::GreyNoise, "gn")]);

    let first = registry.call(ProviderId::GreyNoise, "8.8.8.8", &keys).await.unwrap();
    let second = registry.call(ProviderId::GreyNoise, "8.8.8.8", &keys).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_key_never_reaches_the_vendor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .call(ProviderId::Shodan, "8.8.8.8", &keys(&[]))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Shodan API key is not provided or configured.");
}
