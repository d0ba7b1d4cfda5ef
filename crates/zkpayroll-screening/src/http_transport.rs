//! Blocking `reqwest` transport for screening requests.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::{HttpMethod, ScreeningError, ScreeningTransport, TransportReply, TransportRequest};

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Production transport backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpScreeningTransport {
    client: Client,
}

impl HttpScreeningTransport {
    /// Builds a transport with default connect and request timeouts.
    ///
    /// # Errors
    /// Returns [`ScreeningError::Transport`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, ScreeningError> {
        Self::with_timeouts(
            Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    /// Builds a transport with explicit timeouts.
    ///
    /// # Errors
    /// Returns [`ScreeningError::Transport`] when the HTTP client cannot be built.
    pub fn with_timeouts(connect: Duration, request: Duration) -> Result<Self, ScreeningError> {
        let client = Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .build()
            .map_err(|error| {
                ScreeningError::Transport(format!("failed to build http client: {error}"))
            })?;
        Ok(Self { client })
    }
}

impl ScreeningTransport for HttpScreeningTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportReply, ScreeningError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|error| {
            if error.is_timeout() {
                ScreeningError::Transport("request timed out".to_string())
            } else {
                ScreeningError::Transport(error.without_url().to_string())
            }
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| ScreeningError::Transport(error.without_url().to_string()))?;

        Ok(TransportReply { status, body })
    }
}
