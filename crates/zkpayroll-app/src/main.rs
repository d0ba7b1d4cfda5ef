#![warn(missing_docs)]
//! # zkpayroll-app binary
//!
//! Screening proxy server for zkpayroll.

use std::io::Read;

use tiny_http::{Header, Response, Server};
use tracing::{error, info, warn};
use zkpayroll_app::{
    AppConfig, AppError, app_version, build_screening_service, init_logging, redact_sensitive,
    route_request,
};

/// CLI entry point.
fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("zkpayroll-app: {}", redact_sensitive(&error.to_string()));
            std::process::exit(2);
        }
    };
    if let Err(error) = init_logging(&config) {
        eprintln!("zkpayroll-app: {error}");
        std::process::exit(2);
    }

    if let Err(error) = serve(&config) {
        error!(stage = "startup", action = "serve", %error, "server stopped");
        std::process::exit(1);
    }
}

fn serve(config: &AppConfig) -> Result<(), AppError> {
    let service = build_screening_service(config)?;
    if !service.config().has_api_key() {
        warn!(
            stage = "startup",
            action = "mock_mode",
            "RANGE_API_KEY not set; screening returns mock results"
        );
    }

    let server = Server::http(config.bind)
        .map_err(|error| AppError::Server(format!("failed to bind {}: {error}", config.bind)))?;
    info!(
        stage = "startup",
        action = "listen",
        bind = %config.bind,
        version = app_version(),
        "zkpayroll screening proxy started"
    );

    for mut request in server.incoming_requests() {
        let method = request.method().as_str().to_string();
        let url = request.url().to_string();

        let mut body = Vec::new();
        if let Err(error) = request.as_reader().read_to_end(&mut body) {
            warn!(stage = "http", action = "read_body", %error, "failed reading request body");
            if let Err(error) = request.respond(Response::from_string("").with_status_code(400)) {
                warn!(stage = "http", action = "respond", %error, "failed writing response");
            }
            continue;
        }

        let reply = route_request(&service, &method, &url, &body);
        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        let headers = std::iter::once(("Content-Type", "application/json")).chain(reply.headers);
        for (name, value) in headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }

        if let Err(error) = request.respond(response) {
            warn!(stage = "http", action = "respond", %error, "failed writing response");
        }
    }

    Ok(())
}
