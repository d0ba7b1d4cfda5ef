#![warn(missing_docs)]
//! # zkpayroll-app
//!
//! ## Purpose
//! Wires configuration, screening, account decoding, and settlement into the
//! `zkpayroll` screening proxy and payment workflow.
//!
//! ## Responsibilities
//! - Parse environment configuration into [`AppConfig`].
//! - Install `tracing` output and redact secrets from log text.
//! - Route proxy HTTP requests ([`route_request`]).
//! - Gate salary payments on fresh screening ([`pay_employee`]).
//! - Project on-chain employee accounts into roster entries.
//!
//! ## Data flow
//! Env -> [`AppConfig`] -> `ScreeningService` -> HTTP routes or
//! [`pay_employee`] -> settlement client.
//!
//! ## Ownership and lifetimes
//! Services are built once at startup and borrowed by each request; request
//! data is owned per call.
//!
//! ## Error model
//! Startup failures are [`ConfigError`] / [`AppError`]. Screening routes never
//! fail upstream errors to clients; payments surface [`PaymentError`].
//!
//! ## Security and privacy notes
//! - The API key is never logged, echoed, or included in `Debug` output.
//! - [`redact_sensitive`] strips credential markers before log output.

mod config;
mod payment;
mod routes;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use zkpayroll_accounts::{Address, decode_employee_accounts, matches_payroll};
use zkpayroll_core::Employee;
use zkpayroll_screening::{
    FilePayloadSink, HttpScreeningTransport, ScreeningError, ScreeningService,
};

pub use config::{
    AppConfig, ConfigError, ENV_ALLOW_SYNTHETIC, ENV_API_KEY, ENV_API_URL, ENV_BIND,
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_NETWORK, ENV_PAYLOAD_LOG_DIR, ENV_RISK_THRESHOLD,
    ENV_TAX_RATE_BPS, LogFormat,
};
pub use payment::{PaymentError, PaymentPolicy, PaymentReceipt, PaymentRequest, pay_employee};
pub use routes::{DEBUG_ENV_PATH, HEALTH_PATH, HttpReply, SCREEN_PATH, route_request};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("ZKPAYROLL_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Installs the global `tracing` subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
/// Returns [`AppError::Logging`] when a subscriber is already installed.
pub fn init_logging(config: &AppConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let installed = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|error| AppError::Logging(error.to_string()))
}

/// Builds the production screening service from configuration.
///
/// # Errors
/// Returns [`AppError::Config`] for rejected endpoints and
/// [`AppError::Screening`] when the HTTP client cannot be built.
pub fn build_screening_service(config: &AppConfig) -> Result<ScreeningService, AppError> {
    let transport = HttpScreeningTransport::new()?;
    let service = ScreeningService::new(config.screening_config()?, Arc::new(transport));
    Ok(match &config.payload_log_dir {
        Some(dir) => service.with_payload_sink(Arc::new(FilePayloadSink::new(dir))),
        None => service,
    })
}

/// Decodes the employee accounts owned by `payroll` into roster entries.
///
/// Buffers owned by other payrolls are ignored; malformed buffers are logged
/// and skipped.
pub fn load_employee_records<I, B>(buffers: I, payroll: &Address) -> Vec<Employee>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let owned: Vec<B> = buffers
        .into_iter()
        .filter(|buffer| matches_payroll(buffer.as_ref(), payroll))
        .collect();
    decode_employee_accounts(owned)
        .into_iter()
        .map(|record| record.into_employee())
        .collect()
}

/// Redacts common secret markers in log-safe output.
///
/// Everything after the first marker is replaced.
pub fn redact_sensitive(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let first = ["x-api-key", "api_key", "apikey", "authorization", "bearer"]
        .iter()
        .filter_map(|marker| lower.find(marker).map(|position| (position, *marker)))
        .min_by_key(|(position, _)| *position);

    match first {
        Some((position, marker)) => format!("{}{marker}=<redacted>", &input[..position]),
        None => input.to_string(),
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Screening service could not be built.
    #[error("screening error: {0}")]
    Screening(#[from] ScreeningError),
    /// Logging subscriber could not be installed.
    #[error("logging error: {0}")]
    Logging(String),
    /// HTTP server failure.
    #[error("server error: {0}")]
    Server(String),
}
