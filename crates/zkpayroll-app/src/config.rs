//! Environment configuration, parsed and validated once at startup.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use zkpayroll_core::{DEFAULT_TAX_RATE_BPS, MAX_TAX_RATE_BPS};
use zkpayroll_screening::{
    DEFAULT_SCREENING_API_URL, ScreeningConfig, ScreeningError, validate_screening_endpoint,
};
use zkpayroll_screening_contract::{
    DEFAULT_BLOCKCHAIN, DEFAULT_RISK_THRESHOLD, MAX_RISK_SCORE, MIN_RISK_SCORE,
};

use crate::payment::PaymentPolicy;

/// Upstream risk API key; unset selects mock screening.
pub const ENV_API_KEY: &str = "RANGE_API_KEY";
/// Upstream risk API base URL.
pub const ENV_API_URL: &str = "ZKPAYROLL_SCREENING_API_URL";
/// Default blockchain network.
pub const ENV_NETWORK: &str = "ZKPAYROLL_NETWORK";
/// HTTP listen address.
pub const ENV_BIND: &str = "ZKPAYROLL_BIND";
/// Maximum passing risk score.
pub const ENV_RISK_THRESHOLD: &str = "ZKPAYROLL_RISK_THRESHOLD";
/// Tax withholding in basis points.
pub const ENV_TAX_RATE_BPS: &str = "ZKPAYROLL_TAX_RATE_BPS";
/// Whether mock/fallback screening may gate payments.
pub const ENV_ALLOW_SYNTHETIC: &str = "ZKPAYROLL_ALLOW_SYNTHETIC_SCREENING";
/// Directory for raw upstream payloads.
pub const ENV_PAYLOAD_LOG_DIR: &str = "ZKPAYROLL_PAYLOAD_LOG_DIR";
/// Default tracing level.
pub const ENV_LOG_LEVEL: &str = "ZKPAYROLL_LOG_LEVEL";
/// `text` or `json`.
pub const ENV_LOG_FORMAT: &str = "ZKPAYROLL_LOG_FORMAT";

const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Validated runtime configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Upstream risk API base URL (HTTPS).
    pub screening_api_url: String,
    /// Upstream risk API key.
    pub screening_api_key: Option<String>,
    /// Default blockchain network.
    pub network: String,
    /// HTTP listen address.
    pub bind: SocketAddr,
    /// Maximum passing risk score, 1..=10.
    pub risk_threshold: u8,
    /// Tax withholding in basis points, 0..=10000.
    pub tax_rate_bps: u16,
    /// Whether mock/fallback screening may gate payments.
    pub allow_synthetic_screening: bool,
    /// Raw payload side-log directory.
    pub payload_log_dir: Option<PathBuf>,
    /// Default tracing level; `RUST_LOG` overrides it.
    pub log_level: String,
    /// Log line encoding.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError`] naming the first invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let screening_api_url =
            get(ENV_API_URL).unwrap_or_else(|| DEFAULT_SCREENING_API_URL.to_string());
        validate_screening_endpoint(&screening_api_url).map_err(|source| {
            ConfigError::Screening {
                name: ENV_API_URL,
                source,
            }
        })?;

        let bind_raw = get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: ENV_BIND,
            value: bind_raw.clone(),
            reason: "expected host:port".to_string(),
        })?;

        let risk_threshold = match get(ENV_RISK_THRESHOLD) {
            Some(raw) => parse_ranged(ENV_RISK_THRESHOLD, &raw, MIN_RISK_SCORE, MAX_RISK_SCORE)?,
            None => DEFAULT_RISK_THRESHOLD,
        };

        let tax_rate_bps = match get(ENV_TAX_RATE_BPS) {
            Some(raw) => parse_ranged(ENV_TAX_RATE_BPS, &raw, 0, MAX_TAX_RATE_BPS)?,
            None => DEFAULT_TAX_RATE_BPS,
        };

        let allow_synthetic_screening = match get(ENV_ALLOW_SYNTHETIC) {
            Some(raw) => parse_bool(ENV_ALLOW_SYNTHETIC, &raw)?,
            None => true,
        };

        let log_format = match get(ENV_LOG_FORMAT) {
            None => LogFormat::Text,
            Some(raw) if raw.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(raw) => {
                return Err(ConfigError::Invalid {
                    name: ENV_LOG_FORMAT,
                    value: raw,
                    reason: "expected text or json".to_string(),
                });
            }
        };

        Ok(Self {
            screening_api_url,
            screening_api_key: get(ENV_API_KEY),
            network: get(ENV_NETWORK).unwrap_or_else(|| DEFAULT_BLOCKCHAIN.to_string()),
            bind,
            risk_threshold,
            tax_rate_bps,
            allow_synthetic_screening,
            payload_log_dir: get(ENV_PAYLOAD_LOG_DIR).map(PathBuf::from),
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| "info".to_string()),
            log_format,
        })
    }

    /// Builds the screening service configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Screening`] when the API URL is rejected.
    pub fn screening_config(&self) -> Result<ScreeningConfig, ConfigError> {
        ScreeningConfig::new(&self.screening_api_url, self.screening_api_key.clone())
            .map(|config| config.with_network(self.network.clone()))
            .map_err(|source| ConfigError::Screening {
                name: ENV_API_URL,
                source,
            })
    }

    /// Builds the payment policy from threshold, tax, and synthetic settings.
    pub fn payment_policy(&self) -> PaymentPolicy {
        PaymentPolicy {
            risk_threshold: self.risk_threshold,
            tax_rate_bps: self.tax_rate_bps,
            allow_synthetic_screening: self.allow_synthetic_screening,
            ..PaymentPolicy::default()
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("screening_api_url", &self.screening_api_url)
            .field(
                "screening_api_key",
                &self.screening_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("network", &self.network)
            .field("bind", &self.bind)
            .field("risk_threshold", &self.risk_threshold)
            .field("tax_rate_bps", &self.tax_rate_bps)
            .field("allow_synthetic_screening", &self.allow_synthetic_screening)
            .field("payload_log_dir", &self.payload_log_dir)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_ranged<T>(name: &'static str, raw: &str, min: T, max: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + fmt::Display + Copy,
{
    let invalid = || ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: format!("expected an integer in {min}..={max}"),
    };
    let value: T = raw.parse().map_err(|_| invalid())?;
    if value < min || value > max {
        return Err(invalid());
    }
    Ok(value)
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Configuration errors; the binary exits with status 2 on any of them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds an unusable value.
    #[error("{name}={value:?} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: String,
    },
    /// Screening endpoint policy rejected the configured URL.
    #[error("{name} rejected: {source}")]
    Screening {
        /// Variable name.
        name: &'static str,
        /// Endpoint policy failure.
        source: ScreeningError,
    },
}
