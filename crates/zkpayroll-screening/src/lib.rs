#![warn(missing_docs)]
//! # zkpayroll-screening
//!
//! ## Purpose
//! Screens wallet addresses against the upstream risk API and always returns a
//! renderable [`ScreeningResult`].
//!
//! ## Responsibilities
//! - Validate the screening endpoint policy (HTTPS base URL).
//! - Issue the primary request and, when allowed, one alternate request.
//! - Degrade to mock or fallback results instead of surfacing errors.
//! - Side-log raw upstream payloads through an optional [`PayloadSink`].
//! - Call a screening proxy on behalf of other services ([`ProxyScreeningClient`]).
//!
//! ## Data flow
//! Address -> [`ScreeningService::screen`] -> [`ScreeningTransport`] ->
//! `zkpayroll_screening_contract::normalize_assessment` -> [`ScreeningResult`].
//!
//! ## Ownership and lifetimes
//! Transports and sinks are shared through `Arc<dyn ...>` so the service can be
//! cloned into request handlers.
//!
//! ## Error model
//! [`ScreeningService::screen`] is infallible. [`ScreeningError`] is produced by
//! configuration, transports, and sinks, and is logged on the degrade path.
//!
//! ## Security and privacy notes
//! The API key travels only in request headers. Requests are logged by URL and
//! status, never by header.
//!
//! ## Example
//! ```rust
//! use zkpayroll_screening::{StatusClass, classify_status};
//!
//! assert_eq!(classify_status(200), StatusClass::Success);
//! assert_eq!(classify_status(403), StatusClass::AuthFailure);
//! assert_eq!(classify_status(502), StatusClass::TryAlternate);
//! ```

mod http_transport;
mod payload_sink;

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use zkpayroll_screening_contract::{
    DEFAULT_BLOCKCHAIN, Provenance, ScreenRequest, ScreenResponse, ScreeningResult,
    normalize_assessment, parse_risk_assessment,
};

pub use http_transport::HttpScreeningTransport;
pub use payload_sink::{FilePayloadSink, PayloadSink};

/// Default upstream risk API base URL.
pub const DEFAULT_SCREENING_API_URL: &str = "https://api.range.org/v1";

/// Primary upstream path, relative to the base URL.
pub const PRIMARY_PATH: &str = "address";

/// Alternate upstream path, tried once after a non-auth failure.
pub const ALTERNATE_PATH: &str = "screen/address";

/// Synthetic scores are drawn uniformly from `1..=SYNTHETIC_SCORE_MAX`.
pub const SYNTHETIC_SCORE_MAX: u8 = 8;

/// Screening service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningConfig {
    api_url: Url,
    api_key: Option<String>,
    network: String,
}

impl ScreeningConfig {
    /// Creates a validated configuration.
    ///
    /// A blank `api_key` is treated as absent.
    ///
    /// # Errors
    /// Returns [`ScreeningError::InvalidEndpoint`] when `api_url` is not a valid
    /// HTTPS URL.
    pub fn new(api_url: &str, api_key: Option<String>) -> Result<Self, ScreeningError> {
        let api_url = validate_screening_endpoint(api_url)?;
        Ok(Self {
            api_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            network: DEFAULT_BLOCKCHAIN.to_string(),
        })
    }

    /// Overrides the network used when a caller does not name one.
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Returns the validated base URL.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Returns `true` when an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the configured API key length, or 0 when absent.
    pub fn api_key_len(&self) -> usize {
        self.api_key.as_deref().map_or(0, str::len)
    }

    /// Returns the default network.
    pub fn network(&self) -> &str {
        &self.network
    }
}

/// Validates that a screening base URL parses and uses HTTPS.
///
/// # Errors
/// Returns [`ScreeningError::InvalidEndpoint`] for unparsable or non-HTTPS URLs.
pub fn validate_screening_endpoint(endpoint: &str) -> Result<Url, ScreeningError> {
    let parsed = Url::parse(endpoint).map_err(|error| {
        ScreeningError::InvalidEndpoint(format!("invalid screening url: {error}"))
    })?;

    if parsed.scheme() != "https" {
        return Err(ScreeningError::InvalidEndpoint(
            "screening endpoint must use https".to_string(),
        ));
    }

    Ok(parsed)
}

/// HTTP method used by a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST` with a JSON body.
    Post,
}

/// Outbound request handed to a [`ScreeningTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Fully-qualified URL including query string.
    pub url: String,
    /// Request headers as `(name, value)` pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body for `POST` requests.
    pub body: Option<String>,
}

/// Raw response returned by a [`ScreeningTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

/// Abstract HTTP transport used by the screening service and proxy client.
pub trait ScreeningTransport: Send + Sync {
    /// Sends one request; non-2xx statuses are replies, not errors.
    fn send(&self, request: &TransportRequest) -> Result<TransportReply, ScreeningError>;
}

/// How the service reacts to an upstream status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx: parse the body.
    Success,
    /// 401/403: retrying with the same credential cannot succeed.
    AuthFailure,
    /// Any other status: try the alternate endpoint once.
    TryAlternate,
}

/// Classifies an upstream status code.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        401 | 403 => StatusClass::AuthFailure,
        _ => StatusClass::TryAlternate,
    }
}

/// Wallet screening service with mock and fallback degradation.
#[derive(Clone)]
pub struct ScreeningService {
    config: ScreeningConfig,
    transport: Arc<dyn ScreeningTransport>,
    sink: Option<Arc<dyn PayloadSink>>,
    rng: Arc<Mutex<StdRng>>,
}

impl ScreeningService {
    /// Creates a service with an OS-seeded synthetic score generator.
    pub fn new(config: ScreeningConfig, transport: Arc<dyn ScreeningTransport>) -> Self {
        Self {
            config,
            transport,
            sink: None,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Attaches a raw-payload side log.
    pub fn with_payload_sink(mut self, sink: Arc<dyn PayloadSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replaces the synthetic score generator with a deterministic one.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    /// Screens `address` on `network` (or the configured default).
    ///
    /// Never fails: missing credentials yield a mock result and every upstream
    /// failure yields a fallback result.
    pub fn screen(&self, address: &str, network: Option<&str>) -> ScreeningResult {
        let network = network
            .map(str::trim)
            .filter(|network| !network.is_empty())
            .unwrap_or(self.config.network());

        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!(
                stage = "screening",
                action = "mock",
                "screening api key not configured; returning mock result"
            );
            return self.synthetic(address, Provenance::Mock, None);
        };

        let primary = match self.upstream_request(PRIMARY_PATH, "network", address, network, api_key)
        {
            Ok(request) => request,
            Err(error) => return self.fallback(address, None, &error),
        };

        let reply = match self.transport.send(&primary) {
            Ok(reply) => reply,
            Err(error) => return self.fallback(address, None, &error),
        };
        info!(
            stage = "screening",
            action = "primary",
            status = reply.status,
            "upstream screening response"
        );

        match classify_status(reply.status) {
            StatusClass::Success => self.normalize_reply(address, &reply.body),
            StatusClass::AuthFailure => {
                let error = ScreeningError::HttpStatus(reply.status);
                self.fallback(address, Some(reply.status), &error)
            }
            StatusClass::TryAlternate => self.try_alternate(address, network, api_key, reply.status),
        }
    }

    fn try_alternate(
        &self,
        address: &str,
        network: &str,
        api_key: &str,
        primary_status: u16,
    ) -> ScreeningResult {
        let primary_error = ScreeningError::HttpStatus(primary_status);
        let request = match self.upstream_request(ALTERNATE_PATH, "chain", address, network, api_key)
        {
            Ok(request) => request,
            Err(_) => return self.fallback(address, Some(primary_status), &primary_error),
        };

        match self.transport.send(&request) {
            Ok(reply) if classify_status(reply.status) == StatusClass::Success => {
                info!(
                    stage = "screening",
                    action = "alternate",
                    status = reply.status,
                    "alternate screening endpoint succeeded"
                );
                self.normalize_reply(address, &reply.body)
            }
            Ok(reply) => {
                debug!(
                    stage = "screening",
                    action = "alternate",
                    status = reply.status,
                    "alternate screening endpoint failed"
                );
                self.fallback(address, Some(primary_status), &primary_error)
            }
            Err(error) => {
                debug!(stage = "screening", action = "alternate", %error, "alternate request failed");
                self.fallback(address, Some(primary_status), &primary_error)
            }
        }
    }

    fn normalize_reply(&self, address: &str, body: &str) -> ScreeningResult {
        match parse_risk_assessment(body) {
            Ok(assessment) => {
                self.record_payload(address, body);
                normalize_assessment(address, &assessment)
            }
            Err(error) => {
                let error = ScreeningError::InvalidResponse(error.to_string());
                self.fallback(address, None, &error)
            }
        }
    }

    fn record_payload(&self, address: &str, body: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(error) = sink.record(address, body) {
            warn!(
                stage = "screening",
                action = "payload_log",
                %error,
                "failed to record raw screening payload"
            );
        }
    }

    fn upstream_request(
        &self,
        path: &str,
        network_param: &str,
        address: &str,
        network: &str,
        api_key: &str,
    ) -> Result<TransportRequest, ScreeningError> {
        let base = self.config.api_url.as_str().trim_end_matches('/');
        let url = Url::parse_with_params(
            &format!("{base}/{path}"),
            &[("address", address), (network_param, network)],
        )
        .map_err(|error| ScreeningError::InvalidEndpoint(error.to_string()))?;

        Ok(TransportRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {api_key}")),
                ("X-API-Key".to_string(), api_key.to_string()),
            ],
            body: None,
        })
    }

    fn fallback(
        &self,
        address: &str,
        api_error: Option<u16>,
        cause: &ScreeningError,
    ) -> ScreeningResult {
        warn!(
            stage = "screening",
            action = "fallback",
            api_error,
            error = %cause,
            "upstream screening unavailable; returning fallback result"
        );
        self.synthetic(address, Provenance::Fallback, api_error)
    }

    fn synthetic(
        &self,
        address: &str,
        provenance: Provenance,
        api_error: Option<u16>,
    ) -> ScreeningResult {
        let score = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.random_range(1..=SYNTHETIC_SCORE_MAX)
        };
        ScreeningResult::synthetic(address, score, provenance, api_error)
    }
}

/// Client for a screening proxy exposing `POST /api/screen`.
#[derive(Clone)]
pub struct ProxyScreeningClient {
    endpoint: Url,
    transport: Arc<dyn ScreeningTransport>,
}

impl ProxyScreeningClient {
    /// Creates a proxy client.
    ///
    /// # Errors
    /// Returns [`ScreeningError::InvalidEndpoint`] for URLs that are not
    /// `http` or `https`.
    pub fn new(endpoint: &str, transport: Arc<dyn ScreeningTransport>) -> Result<Self, ScreeningError> {
        let endpoint = Url::parse(endpoint).map_err(|error| {
            ScreeningError::InvalidEndpoint(format!("invalid proxy url: {error}"))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ScreeningError::InvalidEndpoint(
                "proxy endpoint must use http or https".to_string(),
            ));
        }
        Ok(Self {
            endpoint,
            transport,
        })
    }

    /// Screens `address` through the proxy.
    ///
    /// Any failure yields [`ScreeningResult::error_default`].
    pub fn screen(&self, address: &str, blockchain: &str) -> ScreeningResult {
        match self.try_screen(address, blockchain) {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    stage = "screening",
                    action = "proxy_error",
                    %error,
                    "screening proxy call failed; returning error default"
                );
                ScreeningResult::error_default(address)
            }
        }
    }

    /// Screens `address` through the proxy, surfacing failures.
    ///
    /// # Errors
    /// Returns transport errors, [`ScreeningError::HttpStatus`] for non-2xx
    /// replies, and [`ScreeningError::InvalidResponse`] for unusable bodies.
    pub fn try_screen(
        &self,
        address: &str,
        blockchain: &str,
    ) -> Result<ScreeningResult, ScreeningError> {
        let request = ScreenRequest::new(address).with_blockchain(blockchain);
        let body = serde_json::to_string(&request)?;

        let reply = self.transport.send(&TransportRequest {
            method: HttpMethod::Post,
            url: self.endpoint.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        })?;

        if classify_status(reply.status) != StatusClass::Success {
            return Err(ScreeningError::HttpStatus(reply.status));
        }

        let response: ScreenResponse = serde_json::from_str(&reply.body)?;
        match response.data {
            Some(result) if response.success => Ok(result),
            _ => Err(ScreeningError::InvalidResponse(
                response
                    .error
                    .unwrap_or_else(|| "proxy response carried no data".to_string()),
            )),
        }
    }
}

/// Errors produced by screening configuration, transports, and sinks.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// Endpoint violates URL policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Network-level failure.
    #[error("screening transport failure: {0}")]
    Transport(String),
    /// Upstream answered with a non-success status.
    #[error("screening upstream returned status {0}")]
    HttpStatus(u16),
    /// Upstream body could not be used.
    #[error("invalid screening response: {0}")]
    InvalidResponse(String),
    /// JSON encode/decode failure.
    #[error("screening codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    /// Payload side-log failure.
    #[error("payload log failure: {0}")]
    Sink(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for endpoint policy and status classification.

    use super::*;

    #[test]
    fn validates_https_endpoint_policy() {
        validate_screening_endpoint("https://api.example.test/v1").expect("endpoint should pass");
        assert!(validate_screening_endpoint("http://api.example.test/v1").is_err());
        assert!(validate_screening_endpoint("not a url").is_err());
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let config = ScreeningConfig::new(DEFAULT_SCREENING_API_URL, Some("   ".to_string()))
            .expect("config should build");
        assert!(!config.has_api_key());
        assert_eq!(config.api_key_len(), 0);
    }

    #[test]
    fn classifies_auth_failures_separately() {
        assert_eq!(classify_status(204), StatusClass::Success);
        assert_eq!(classify_status(401), StatusClass::AuthFailure);
        assert_eq!(classify_status(404), StatusClass::TryAlternate);
        assert_eq!(classify_status(500), StatusClass::TryAlternate);
    }
}
