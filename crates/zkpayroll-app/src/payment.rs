//! Screening-gated salary payment.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use zkpayroll_accounts::{AccountError, Address};
use zkpayroll_core::{CoreError, DEFAULT_TAX_RATE_BPS, Employee, payment_reference, split_salary};
use zkpayroll_screening::ScreeningService;
use zkpayroll_screening_contract::{DEFAULT_RISK_THRESHOLD, ScreeningResult, passes_screening};
use zkpayroll_settlement::{
    MessageSigner, SalaryPayment, SettlementClient, SettlementFailure, SettlementReceipt,
    TokenSymbol, settle_salary,
};

/// Rules applied before any money moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPolicy {
    /// Maximum passing risk score.
    pub risk_threshold: u8,
    /// Tax withholding in basis points.
    pub tax_rate_bps: u16,
    /// Accept mock/fallback screening results (logged at warn level).
    pub allow_synthetic_screening: bool,
    /// Token for both settlement legs.
    pub token: TokenSymbol,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            allow_synthetic_screening: true,
            token: TokenSymbol::default(),
        }
    }
}

/// One salary payment to perform.
#[derive(Debug, Clone)]
pub struct PaymentRequest<'a> {
    /// Employee being paid; `salary` is the gross amount.
    pub employee: &'a Employee,
    /// Paying wallet.
    pub employer: Address,
    /// Wallet receiving withheld tax.
    pub tax_authority: Address,
    /// Unix seconds used for the payment reference.
    pub now: i64,
}

/// Completed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// Paid employee id.
    pub employee_id: String,
    /// Stable payment reference.
    pub reference: String,
    /// Screening result that gated the payment.
    pub screening: ScreeningResult,
    /// Settlement transaction ids and amounts.
    pub settlement: SettlementReceipt,
}

/// Re-screens the employee wallet, splits the salary, and settles both legs.
///
/// # Errors
/// Returns [`PaymentError`] for inactive employees, unusable wallets,
/// screening that is unavailable or rejected, invalid amounts, and settlement
/// failures (including partial settlement).
pub fn pay_employee(
    screening: &ScreeningService,
    settlement: &dyn SettlementClient,
    signer: &dyn MessageSigner,
    policy: &PaymentPolicy,
    request: &PaymentRequest<'_>,
) -> Result<PaymentReceipt, PaymentError> {
    let employee = request.employee;
    if !employee.is_active {
        return Err(PaymentError::InactiveEmployee(employee.id.clone()));
    }
    let wallet: Address = employee.wallet.parse()?;

    let result = screening.screen(&employee.wallet, None);
    gate_screening(&employee.id, &result, policy)?;

    let split = split_salary(employee.salary, policy.tax_rate_bps)?;
    let payment = SalaryPayment {
        employer: request.employer,
        employee: wallet,
        tax_authority: request.tax_authority,
        split,
        token: policy.token.clone(),
    };
    let settlement = settle_salary(settlement, signer, &payment)?;

    let reference = payment_reference(&employee.id, request.now);
    info!(
        stage = "payment",
        action = "settled",
        employee_id = %employee.id,
        reference = %reference,
        "salary payment settled"
    );

    Ok(PaymentReceipt {
        employee_id: employee.id.clone(),
        reference,
        screening: result,
        settlement,
    })
}

fn gate_screening(
    employee_id: &str,
    result: &ScreeningResult,
    policy: &PaymentPolicy,
) -> Result<(), PaymentError> {
    if result.is_synthetic() {
        if !policy.allow_synthetic_screening || result.is_error() {
            return Err(PaymentError::ScreeningUnavailable(employee_id.to_string()));
        }
        warn!(
            stage = "payment",
            action = "synthetic_screening",
            employee_id,
            mock = result.is_mock(),
            fallback = result.is_fallback(),
            "payment gated on synthetic screening result"
        );
    }

    let Some(score) = result.risk_score else {
        return Err(PaymentError::ScreeningUnavailable(employee_id.to_string()));
    };
    if result.sanctioned {
        return Err(PaymentError::Sanctioned(employee_id.to_string()));
    }
    if !passes_screening(score, Some(policy.risk_threshold)) {
        return Err(PaymentError::ScreeningRejected {
            employee_id: employee_id.to_string(),
            risk_score: score,
            threshold: policy.risk_threshold,
        });
    }
    Ok(())
}

/// Payment failures, surfaced without retry.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Employee is deactivated.
    #[error("employee {0} is inactive")]
    InactiveEmployee(String),
    /// Employee wallet is not a valid address.
    #[error("invalid employee wallet: {0}")]
    InvalidWallet(#[from] AccountError),
    /// No usable risk score was obtained.
    #[error("screening unavailable for employee {0}")]
    ScreeningUnavailable(String),
    /// Wallet is directly linked to malicious activity.
    #[error("employee {0} wallet is sanctioned")]
    Sanctioned(String),
    /// Risk score exceeds the threshold.
    #[error("screening rejected employee {employee_id}: risk score {risk_score} exceeds {threshold}")]
    ScreeningRejected {
        /// Rejected employee.
        employee_id: String,
        /// Score returned by screening.
        risk_score: u8,
        /// Configured threshold.
        threshold: u8,
    },
    /// Salary amount or tax rate is invalid.
    #[error("invalid payment amount: {0}")]
    Amount(#[from] CoreError),
    /// One of the settlement legs failed.
    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementFailure),
}
