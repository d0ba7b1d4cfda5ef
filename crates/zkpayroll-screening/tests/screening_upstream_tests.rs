//! Integration tests for upstream requests, alternate endpoint, and side log.

mod common;

use std::sync::Arc;

use zkpayroll_screening::{
    FilePayloadSink, HttpMethod, PayloadSink, ProxyScreeningClient, ScreeningError,
};
use zkpayroll_screening_contract::{Provenance, RiskLevel, ScreenResponse, ScreeningResult};

use common::{ADDRESS, ScriptedTransport, keyed_service};

const LOW_RISK_BODY: &str =
    r#"{"riskScore":2,"riskLevel":"Low risk","numHops":4,"maliciousAddressesFound":[]}"#;

#[derive(Debug)]
struct BrokenSink;

impl PayloadSink for BrokenSink {
    fn record(&self, _address: &str, _payload: &str) -> Result<(), ScreeningError> {
        Err(ScreeningError::Sink(std::io::Error::other("disk full")))
    }
}

#[test]
fn screening_upstream_tests_primary_request_carries_credentials() {
    let transport = ScriptedTransport::new(vec![Ok((200, LOW_RISK_BODY))]);
    let service = keyed_service(transport.clone(), 1);

    let result = service.screen(ADDRESS, None);

    assert_eq!(result.provenance, Provenance::Upstream);
    assert_eq!(result.risk_score, Some(2));
    assert_eq!(result.risk_level, RiskLevel::Low);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(
        request.url,
        format!("https://api.range.org/v1/address?address={ADDRESS}&network=solana")
    );
    assert!(
        request
            .headers
            .contains(&("Authorization".to_string(), "Bearer test-key".to_string()))
    );
    assert!(
        request
            .headers
            .contains(&("X-API-Key".to_string(), "test-key".to_string()))
    );
}

#[test]
fn screening_upstream_tests_alternate_endpoint_recovers() {
    let transport = ScriptedTransport::new(vec![Ok((502, "bad gateway")), Ok((200, LOW_RISK_BODY))]);
    let service = keyed_service(transport.clone(), 1);

    let result = service.screen(ADDRESS, Some("ethereum"));

    assert_eq!(result.provenance, Provenance::Upstream);
    assert_eq!(result.api_error, None);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].url,
        format!("https://api.range.org/v1/screen/address?address={ADDRESS}&chain=ethereum")
    );
}

#[test]
fn screening_upstream_tests_query_values_are_encoded() {
    let transport = ScriptedTransport::new(vec![Ok((200, "{}"))]);
    let service = keyed_service(transport.clone(), 1);

    service.screen("a b&c", None);

    let requests = transport.requests();
    assert!(requests[0].url.contains("address=a+b%26c"));
}

#[test]
fn screening_upstream_tests_payload_side_log_writes_file() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let transport = ScriptedTransport::new(vec![Ok((200, LOW_RISK_BODY))]);
    let service = keyed_service(transport, 1)
        .with_payload_sink(Arc::new(FilePayloadSink::new(dir.path().join("payloads"))));

    service.screen(ADDRESS, None);

    let entries: Vec<_> = std::fs::read_dir(dir.path().join("payloads"))
        .expect("payload dir should exist")
        .collect::<Result<_, _>>()
        .expect("entries should read");
    assert_eq!(entries.len(), 1);
    let written = std::fs::read_to_string(entries[0].path()).expect("payload should read");
    assert_eq!(written, LOW_RISK_BODY);
}

#[test]
fn screening_upstream_tests_side_log_failure_does_not_change_result() {
    let transport = ScriptedTransport::new(vec![Ok((200, LOW_RISK_BODY))]);
    let service = keyed_service(transport, 1).with_payload_sink(Arc::new(BrokenSink));

    let result = service.screen(ADDRESS, None);

    assert_eq!(result.provenance, Provenance::Upstream);
    assert_eq!(result.risk_score, Some(2));
}

#[test]
fn screening_upstream_tests_proxy_client_returns_data() {
    let upstream = ScreeningResult::synthetic(ADDRESS, 3, Provenance::Mock, None);
    let body = serde_json::to_string(&ScreenResponse::ok(upstream.clone()))
        .expect("response should serialize");
    let transport = ScriptedTransport::new(vec![Ok((200, body.as_str()))]);
    let client = ProxyScreeningClient::new("http://127.0.0.1:3000/api/screen", transport.clone())
        .expect("proxy client should build");

    let result = client.screen(ADDRESS, "solana");

    assert_eq!(result, upstream);
    let requests = transport.requests();
    assert_eq!(requests[0].method, HttpMethod::Post);
    let sent: serde_json::Value =
        serde_json::from_str(requests[0].body.as_deref().expect("body should be sent"))
            .expect("body should be json");
    assert_eq!(sent["walletAddress"], ADDRESS);
    assert_eq!(sent["blockchain"], "solana");
}

#[test]
fn screening_upstream_tests_proxy_client_failure_returns_error_default() {
    let transport = ScriptedTransport::new(vec![Ok((400, r#"{"success":false,"error":"bad"}"#))]);
    let client = ProxyScreeningClient::new("http://127.0.0.1:3000/api/screen", transport)
        .expect("proxy client should build");

    let result = client.screen(ADDRESS, "solana");

    assert!(result.is_error());
    assert_eq!(result.risk_score, None);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert!(!result.flagged);
}
