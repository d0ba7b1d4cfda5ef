#![warn(missing_docs)]
//! # zkpayroll-screening-contract
//!
//! ## Purpose
//! Defines the wallet-screening contract: the upstream risk-assessment schema,
//! the canonical [`ScreeningResult`], and the normalization between them.
//!
//! ## Responsibilities
//! - Parse upstream risk assessments through one explicit schema.
//! - Normalize assessments into results that satisfy the screening invariants.
//! - Build synthetic results for mock, fallback, and error paths.
//! - Gate payments with [`passes_screening`].
//! - Define the proxy request/response envelope.
//!
//! ## Data flow
//! Raw upstream JSON -> [`parse_risk_assessment`] -> [`normalize_assessment`]
//! -> [`ScreeningResult`] -> [`ScreenResponse`] body or payment gate.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers.
//!
//! ## Error model
//! Only parsing can fail ([`ScreeningContractError`]); normalization is total.
//! Callers decide how a parse failure degrades.
//!
//! ## Security and privacy notes
//! This crate never sees API credentials. Upstream reasoning text is passed
//! through untouched and must be treated as untrusted display content.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Lowest risk score on the upstream scale.
pub const MIN_RISK_SCORE: u8 = 1;

/// Highest risk score on the upstream scale.
pub const MAX_RISK_SCORE: u8 = 10;

/// Default payment gate: scores above this value fail screening.
pub const DEFAULT_RISK_THRESHOLD: u8 = 6;

/// Blockchain screened when a request does not name one.
pub const DEFAULT_BLOCKCHAIN: &str = "solana";

/// Upstream risk assessment for one address (1-10 risk score API).
///
/// Fields of unexpected JSON types are treated as absent rather than failing
/// the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Risk score, accepted only when numeric.
    #[serde(default, deserialize_with = "numeric_only")]
    pub risk_score: Option<f64>,
    /// Free-text risk category such as `"Low risk"`.
    #[serde(default, deserialize_with = "text_only")]
    pub risk_level: Option<String>,
    /// Hops between the address and the nearest known-bad actor.
    #[serde(default, deserialize_with = "numeric_only")]
    pub num_hops: Option<f64>,
    /// Known malicious addresses associated with the screened address.
    #[serde(default, deserialize_with = "address_list")]
    pub malicious_addresses_found: Vec<String>,
    /// Upstream explanation of the score.
    #[serde(default, deserialize_with = "text_only")]
    pub reasoning: Option<String>,
}

/// Canonical risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score 1-2.
    Low,
    /// Score 3-5.
    Medium,
    /// Score 6-10.
    High,
}

/// Where a screening result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ProvenanceFlags", try_from = "ProvenanceFlags")]
pub enum Provenance {
    /// Genuine upstream response.
    Upstream,
    /// Synthetic demo data; no upstream attempt was made.
    Mock,
    /// Synthetic data substituted after a failed upstream attempt.
    Fallback,
    /// Safe default produced on the error path.
    Error,
}

/// Wire form of [`Provenance`]: at most one flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceFlags {
    /// Synthetic demo data.
    #[serde(default)]
    pub mock: bool,
    /// Synthetic data after a real failure.
    #[serde(default)]
    pub fallback: bool,
    /// Error-path default.
    #[serde(default)]
    pub error: bool,
}

impl From<Provenance> for ProvenanceFlags {
    fn from(provenance: Provenance) -> Self {
        Self {
            mock: provenance == Provenance::Mock,
            fallback: provenance == Provenance::Fallback,
            error: provenance == Provenance::Error,
        }
    }
}

impl TryFrom<ProvenanceFlags> for Provenance {
    type Error = ScreeningContractError;

    fn try_from(flags: ProvenanceFlags) -> Result<Self, ScreeningContractError> {
        match (flags.mock, flags.fallback, flags.error) {
            (false, false, false) => Ok(Provenance::Upstream),
            (true, false, false) => Ok(Provenance::Mock),
            (false, true, false) => Ok(Provenance::Fallback),
            (false, false, true) => Ok(Provenance::Error),
            _ => Err(ScreeningContractError::InvalidContract(
                "more than one provenance flag set".to_string(),
            )),
        }
    }
}

/// Canonical screening outcome for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningResult {
    /// Screened address, echoed from the request.
    pub address: String,
    /// Risk score in [1, 10]; `None` when upstream omitted it.
    pub risk_score: Option<u8>,
    /// Derived or upstream-labelled risk level.
    pub risk_level: RiskLevel,
    /// Elevated risk indicated.
    pub flagged: bool,
    /// Directly malicious; implies `flagged`.
    pub sanctioned: bool,
    /// Legacy 0-100 trust score (100 = safest).
    pub trust_score: Option<u8>,
    /// Result provenance, serialized as `mock` / `fallback` / `error` flags.
    #[serde(flatten)]
    pub provenance: Provenance,
    /// Upstream HTTP status that caused a fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_error: Option<u16>,
    /// Upstream explanation, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Malicious addresses reported by upstream.
    #[serde(default)]
    pub malicious_addresses: Vec<String>,
    /// RFC 3339 time the result was produced.
    pub last_updated: String,
}

impl ScreeningResult {
    /// Safe default used when a screening could not be obtained at all.
    pub fn error_default(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            risk_score: None,
            risk_level: RiskLevel::Medium,
            flagged: false,
            sanctioned: false,
            trust_score: None,
            provenance: Provenance::Error,
            api_error: None,
            reasoning: None,
            malicious_addresses: Vec::new(),
            last_updated: now_rfc3339(),
        }
    }

    /// Synthetic result for `score`, used for mock and fallback provenance.
    ///
    /// `score` is clamped into [1, 10]. Synthetic results are flagged above 6
    /// and never sanctioned.
    pub fn synthetic(
        address: impl Into<String>,
        score: u8,
        provenance: Provenance,
        api_error: Option<u16>,
    ) -> Self {
        let score = score.clamp(MIN_RISK_SCORE, MAX_RISK_SCORE);
        Self {
            address: address.into(),
            risk_score: Some(score),
            risk_level: risk_level_for_score(score),
            flagged: score > DEFAULT_RISK_THRESHOLD,
            sanctioned: false,
            trust_score: Some(legacy_trust_score(score)),
            provenance,
            api_error,
            reasoning: None,
            malicious_addresses: Vec::new(),
            last_updated: now_rfc3339(),
        }
    }

    /// Returns `true` for synthetic demo data.
    pub fn is_mock(&self) -> bool {
        self.provenance == Provenance::Mock
    }

    /// Returns `true` for synthetic data substituted after a failure.
    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    /// Returns `true` for the error-path default.
    pub fn is_error(&self) -> bool {
        self.provenance == Provenance::Error
    }

    /// Returns `true` when the result did not come from a genuine upstream
    /// response.
    pub fn is_synthetic(&self) -> bool {
        self.provenance != Provenance::Upstream
    }

    /// Checks the invariants every result must satisfy.
    ///
    /// # Errors
    /// Returns [`ScreeningContractError::InvalidContract`] describing the first
    /// violated invariant.
    pub fn check_invariants(&self) -> Result<(), ScreeningContractError> {
        if let Some(score) = self.risk_score {
            if !(MIN_RISK_SCORE..=MAX_RISK_SCORE).contains(&score) {
                return Err(ScreeningContractError::InvalidContract(format!(
                    "riskScore {score} outside [1, 10]"
                )));
            }
        }
        if self.sanctioned && !self.flagged {
            return Err(ScreeningContractError::InvalidContract(
                "sanctioned result is not flagged".to_string(),
            ));
        }
        if self.trust_score.is_some_and(|trust| trust > 100) {
            return Err(ScreeningContractError::InvalidContract(
                "trustScore above 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Proxy request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRequest {
    /// Address to screen; required.
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Blockchain network of the address; `None` defers to the server default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<String>,
}

impl ScreenRequest {
    /// Builds a request for `wallet_address` without naming a blockchain.
    pub fn new(wallet_address: impl Into<String>) -> Self {
        Self {
            wallet_address: Some(wallet_address.into()),
            blockchain: None,
        }
    }

    /// Names the blockchain explicitly.
    pub fn with_blockchain(mut self, blockchain: impl Into<String>) -> Self {
        self.blockchain = Some(blockchain.into());
        self
    }

    /// Returns the trimmed blockchain, or `None` when missing, null, or blank.
    pub fn blockchain(&self) -> Option<&str> {
        self.blockchain
            .as_deref()
            .map(str::trim)
            .filter(|blockchain| !blockchain.is_empty())
    }

    /// Returns the trimmed wallet address, or `None` when missing or blank.
    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

/// Proxy response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenResponse {
    /// Whether `data` holds a result.
    pub success: bool,
    /// Screening result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ScreeningResult>,
    /// Client-facing error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScreenResponse {
    /// Successful response carrying `result`.
    pub fn ok(result: ScreeningResult) -> Self {
        Self {
            success: true,
            data: Some(result),
            error: None,
        }
    }

    /// Failed response carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Parses raw upstream JSON into a risk assessment.
///
/// # Errors
/// Returns [`ScreeningContractError::Decode`] for invalid JSON and
/// [`ScreeningContractError::InvalidContract`] when the payload is not a JSON
/// object.
pub fn parse_risk_assessment(raw: &str) -> Result<RiskAssessment, ScreeningContractError> {
    let value: Value = serde_json::from_str(raw).map_err(ScreeningContractError::Decode)?;
    if !value.is_object() {
        return Err(ScreeningContractError::InvalidContract(
            "risk assessment must be a JSON object".to_string(),
        ));
    }
    RiskAssessment::deserialize(value).map_err(ScreeningContractError::Decode)
}

/// Normalizes an upstream assessment into a canonical result.
///
/// Never fails: missing or unusable fields degrade to safe defaults.
pub fn normalize_assessment(address: &str, assessment: &RiskAssessment) -> ScreeningResult {
    let risk_score = assessment.risk_score.and_then(score_from_numeric);
    let mut flagged = false;
    let mut sanctioned = false;

    let risk_level = match assessment.risk_level.as_deref().and_then(classify_label) {
        Some((level, label_flagged)) => {
            flagged |= label_flagged;
            level
        }
        None => match risk_score {
            Some(score) => {
                flagged |= score >= DEFAULT_RISK_THRESHOLD;
                risk_level_for_score(score)
            }
            None => RiskLevel::Medium,
        },
    };

    // Directly malicious: zero hops to a known-bad actor, or the maximum score.
    let direct_hit = assessment.num_hops.is_some_and(|hops| hops == 0.0);
    if direct_hit || risk_score == Some(MAX_RISK_SCORE) {
        flagged = true;
        sanctioned = true;
    }

    if !assessment.malicious_addresses_found.is_empty() {
        flagged = true;
    }

    ScreeningResult {
        address: address.to_string(),
        risk_score,
        risk_level,
        flagged,
        sanctioned,
        trust_score: risk_score.map(legacy_trust_score),
        provenance: Provenance::Upstream,
        api_error: None,
        reasoning: assessment.reasoning.clone(),
        malicious_addresses: assessment.malicious_addresses_found.clone(),
        last_updated: now_rfc3339(),
    }
}

/// Maps a risk score to its level: 1-2 low, 3-5 medium, 6-10 high.
pub fn risk_level_for_score(score: u8) -> RiskLevel {
    match score {
        0..=2 => RiskLevel::Low,
        3..=5 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

/// Converts a 1-10 risk score to the legacy 0-100 trust scale.
pub fn legacy_trust_score(score: u8) -> u8 {
    let score = score.clamp(MIN_RISK_SCORE, MAX_RISK_SCORE);
    ((f64::from(MAX_RISK_SCORE - score) / 9.0) * 100.0).round() as u8
}

/// Returns `true` when `risk_score` is at or below `threshold`
/// (default [`DEFAULT_RISK_THRESHOLD`]). Lower thresholds are stricter.
pub fn passes_screening(risk_score: u8, threshold: Option<u8>) -> bool {
    risk_score <= threshold.unwrap_or(DEFAULT_RISK_THRESHOLD)
}

/// Current UTC time in RFC 3339 form.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn score_from_numeric(raw: f64) -> Option<u8> {
    let rounded = raw.round();
    if rounded >= f64::from(MIN_RISK_SCORE) && rounded <= f64::from(MAX_RISK_SCORE) {
        Some(rounded as u8)
    } else {
        None
    }
}

/// First match wins; returns the level and whether the label alone flags.
fn classify_label(label: &str) -> Option<(RiskLevel, bool)> {
    if label.contains("CRITICAL") || label.contains("Extremely high") {
        Some((RiskLevel::High, true))
    } else if label.contains("High risk") {
        Some((RiskLevel::High, false))
    } else if label.contains("Medium risk") {
        Some((RiskLevel::Medium, false))
    } else if label.contains("Low risk") || label.contains("Very low risk") {
        Some((RiskLevel::Low, false))
    } else {
        None
    }
}

fn numeric_only<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64())
}

fn text_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn address_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(address) => address,
            Value::Object(fields) => match fields.get("address") {
                Some(Value::String(address)) => address.clone(),
                _ => Value::Object(fields).to_string(),
            },
            other => other.to_string(),
        })
        .collect())
}

/// Screening contract errors.
#[derive(Debug, Error)]
pub enum ScreeningContractError {
    /// JSON decode failure.
    #[error("screening decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("screening contract violation: {0}")]
    InvalidContract(String),
}
