//! HTTP routing for the screening proxy, independent of any socket.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use zkpayroll_screening::ScreeningService;
use zkpayroll_screening_contract::{ScreenRequest, ScreenResponse, now_rfc3339};

use crate::APP_VERSION;

/// Proxy screening route.
pub const SCREEN_PATH: &str = "/api/screen";
/// Credential presence diagnostics route.
pub const DEBUG_ENV_PATH: &str = "/api/debug-env";
/// Liveness route.
pub const HEALTH_PATH: &str = "/healthz";

/// JSON reply produced by [`route_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: String,
    /// Extra headers beyond `Content-Type: application/json`.
    pub headers: Vec<(&'static str, &'static str)>,
}

impl HttpReply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value)
            .unwrap_or_else(|_| r#"{"success":false,"error":"encoding failure"}"#.to_string());
        Self {
            status,
            body,
            headers: Vec::new(),
        }
    }

    fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

/// Routes one request. `path` may include a query string, which is ignored.
pub fn route_request(
    service: &ScreeningService,
    method: &str,
    path: &str,
    body: &[u8],
) -> HttpReply {
    let path = path.split_once('?').map_or(path, |(path, _)| path);

    match (method, path) {
        ("POST", SCREEN_PATH) => screen(service, body),
        ("GET", DEBUG_ENV_PATH) => debug_env(service),
        ("GET", HEALTH_PATH) => HttpReply::json(
            200,
            &json!({ "status": "ok", "version": APP_VERSION }),
        ),
        _ => {
            debug!(stage = "http", action = "not_found", method, path, "unknown route");
            HttpReply::json(404, &ScreenResponse::failure("Not found"))
        }
    }
}

fn screen(service: &ScreeningService, body: &[u8]) -> HttpReply {
    let request: ScreenRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => {
            return HttpReply::json(400, &ScreenResponse::failure("Invalid JSON body"));
        }
    };
    let Some(address) = request.wallet_address() else {
        return HttpReply::json(400, &ScreenResponse::failure("Wallet address is required"));
    };

    let result = service.screen(address, request.blockchain());
    info!(
        stage = "http",
        action = "screen",
        risk_score = result.risk_score,
        flagged = result.flagged,
        mock = result.is_mock(),
        fallback = result.is_fallback(),
        "screening request served"
    );
    HttpReply::json(200, &ScreenResponse::ok(result))
}

// Reports presence and length only; never the key or any prefix of it.
fn debug_env(service: &ScreeningService) -> HttpReply {
    let config = service.config();
    HttpReply::json(
        200,
        &json!({
            "timestamp": now_rfc3339(),
            "rangeApiKey": {
                "exists": config.has_api_key(),
                "length": config.api_key_len(),
            },
        }),
    )
    .with_header("Cache-Control", "no-store, no-cache, must-revalidate")
}
