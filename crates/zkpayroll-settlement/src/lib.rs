#![warn(missing_docs)]
//! # zkpayroll-settlement
//!
//! ## Purpose
//! Settles salaries through an injected confidential-transfer client.
//!
//! ## Responsibilities
//! - Define the [`SettlementClient`] and [`MessageSigner`] seams.
//! - Validate token symbols against the supported list.
//! - Run the two-leg salary settlement (net salary, then tax).
//! - Report partial settlement with the completed transaction id.
//!
//! ## Data flow
//! [`SalaryPayment`] -> [`settle_salary`] -> two [`TransferRequest`]s through
//! [`SettlementClient::transfer`] -> [`SettlementReceipt`] or
//! [`SettlementFailure`].
//!
//! ## Ownership and lifetimes
//! Clients and signers are borrowed for the duration of one settlement; the
//! caller constructs them explicitly and passes them down.
//!
//! ## Error model
//! Client failures are [`SettlementError`]. The two legs are not atomic:
//! [`SettlementFailure::TaxLeg`] carries the already-submitted net salary
//! transaction and no rollback is attempted.
//!
//! ## Security and privacy notes
//! Amounts are logged only as totals per leg; signer material never leaves the
//! [`MessageSigner`] implementation.
//!
//! ## Example
//! ```rust
//! use zkpayroll_settlement::TokenSymbol;
//!
//! assert!("USDC".parse::<TokenSymbol>().is_ok());
//! assert!("DOGE".parse::<TokenSymbol>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};
use zkpayroll_accounts::Address;
use zkpayroll_core::SalarySplit;

/// Tokens the confidential transfer network settles.
pub const SUPPORTED_TOKENS: &[&str] = &[
    "USDC", "SOL", "RADR", "ORE", "BONK", "JIM", "GODL", "HUSTLE", "ZEC", "CRT", "BLACKCOIN",
    "GIL", "ANON", "WLFI", "USD1", "AOL", "IQLABS", "SANA", "POKI", "RAIN", "HOSICO", "SKR",
];

/// Token used when none is configured.
pub const DEFAULT_TOKEN: &str = "SOL";

/// Validated token symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TokenSymbol(String);

impl TokenSymbol {
    /// Returns the symbol text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TokenSymbol {
    fn default() -> Self {
        Self(DEFAULT_TOKEN.to_string())
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TokenSymbol {
    type Err = SettlementError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SUPPORTED_TOKENS
            .iter()
            .find(|token| **token == value)
            .map(|token| Self((*token).to_string()))
            .ok_or_else(|| SettlementError::UnsupportedToken(value.to_string()))
    }
}

impl From<TokenSymbol> for String {
    fn from(token: TokenSymbol) -> Self {
        token.0
    }
}

impl TryFrom<String> for TokenSymbol {
    type Error = SettlementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identifier returned by the transfer network for a submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Creates a transaction id.
    ///
    /// # Errors
    /// Returns [`SettlementError::InvalidResponse`] for blank ids.
    pub fn new(value: impl Into<String>) -> Result<Self, SettlementError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(SettlementError::InvalidResponse(
                "transfer returned an empty transaction id".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Returns the id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One confidential transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Paying wallet.
    pub sender: Address,
    /// Receiving wallet.
    pub recipient: Address,
    /// Amount in token smallest units.
    pub amount: u64,
    /// Token being moved.
    pub token: TokenSymbol,
}

/// Signs transfer authorization messages on behalf of the sender wallet.
pub trait MessageSigner: Send + Sync {
    /// Signs `message` and returns the signature bytes.
    fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SettlementError>;
}

/// Confidential transfer network client.
pub trait SettlementClient: Send + Sync {
    /// Submits one transfer, signing through `signer`.
    fn transfer(
        &self,
        request: &TransferRequest,
        signer: &dyn MessageSigner,
    ) -> Result<TransactionId, SettlementError>;

    /// Returns the confidential balance of `wallet` in smallest units.
    fn balance(&self, wallet: &Address, token: &TokenSymbol) -> Result<u64, SettlementError>;
}

/// A salary ready to settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryPayment {
    /// Employer wallet paying both legs.
    pub employer: Address,
    /// Employee wallet receiving the net salary.
    pub employee: Address,
    /// Tax authority wallet receiving the withheld tax.
    pub tax_authority: Address,
    /// Gross, tax, and net amounts.
    pub split: SalarySplit,
    /// Token for both legs.
    pub token: TokenSymbol,
}

/// Transaction ids of a fully settled salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    /// Net salary transfer.
    pub net_salary_tx: TransactionId,
    /// Tax transfer.
    pub tax_tx: TransactionId,
    /// Amounts settled.
    pub split: SalarySplit,
}

/// Settles `payment`: net salary to the employee first, then tax.
///
/// A zero tax leg is still submitted.
///
/// # Errors
/// Returns [`SettlementFailure::NetSalaryLeg`] when the first transfer fails
/// (the tax leg is not attempted) and [`SettlementFailure::TaxLeg`] when only
/// the second transfer fails.
pub fn settle_salary(
    client: &dyn SettlementClient,
    signer: &dyn MessageSigner,
    payment: &SalaryPayment,
) -> Result<SettlementReceipt, SettlementFailure> {
    let net_request = TransferRequest {
        sender: payment.employer,
        recipient: payment.employee,
        amount: payment.split.net,
        token: payment.token.clone(),
    };
    let net_salary_tx = client.transfer(&net_request, signer).map_err(|source| {
        error!(
            stage = "settlement",
            action = "net_salary",
            error = %source,
            "net salary transfer failed"
        );
        SettlementFailure::NetSalaryLeg(source)
    })?;
    info!(
        stage = "settlement",
        action = "net_salary",
        tx = %net_salary_tx,
        amount = payment.split.net,
        token = %payment.token,
        "net salary sent"
    );

    let tax_request = TransferRequest {
        sender: payment.employer,
        recipient: payment.tax_authority,
        amount: payment.split.tax,
        token: payment.token.clone(),
    };
    let tax_tx = match client.transfer(&tax_request, signer) {
        Ok(tax_tx) => tax_tx,
        Err(source) => {
            error!(
                stage = "settlement",
                action = "tax",
                net_salary_tx = %net_salary_tx,
                error = %source,
                "tax transfer failed after net salary was sent"
            );
            return Err(SettlementFailure::TaxLeg {
                net_salary_tx,
                source,
            });
        }
    };
    info!(
        stage = "settlement",
        action = "tax",
        tx = %tax_tx,
        amount = payment.split.tax,
        token = %payment.token,
        "tax sent"
    );

    Ok(SettlementReceipt {
        net_salary_tx,
        tax_tx,
        split: payment.split,
    })
}

/// Returns `true` when `wallet` holds at least `required` of `token`.
///
/// # Errors
/// Propagates balance lookup failures.
pub fn has_sufficient_balance(
    client: &dyn SettlementClient,
    wallet: &Address,
    required: u64,
    token: &TokenSymbol,
) -> Result<bool, SettlementError> {
    Ok(client.balance(wallet, token)? >= required)
}

/// Errors produced by settlement clients and signers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// Token is not on the supported list.
    #[error("unsupported token: {0}")]
    UnsupportedToken(String),
    /// Signer refused or failed to sign.
    #[error("signing failed: {0}")]
    Signing(String),
    /// Transfer network rejected the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
    /// Transport failure reaching the transfer network.
    #[error("settlement transport failure: {0}")]
    Transport(String),
    /// Response violated the client contract.
    #[error("invalid settlement response: {0}")]
    InvalidResponse(String),
}

/// Salary settlement failure, tagged with the leg that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementFailure {
    /// Net salary transfer failed; nothing was settled.
    #[error("net salary transfer failed: {0}")]
    NetSalaryLeg(#[source] SettlementError),
    /// Tax transfer failed after the net salary was sent.
    #[error("tax transfer failed after net salary transaction {net_salary_tx}: {source}")]
    TaxLeg {
        /// Completed net salary transfer.
        net_salary_tx: TransactionId,
        /// Tax leg failure.
        source: SettlementError,
    },
}

impl SettlementFailure {
    /// Returns the net salary transaction when it completed.
    pub fn completed_transaction(&self) -> Option<&TransactionId> {
        match self {
            Self::NetSalaryLeg(_) => None,
            Self::TaxLeg { net_salary_tx, .. } => Some(net_salary_tx),
        }
    }
}
