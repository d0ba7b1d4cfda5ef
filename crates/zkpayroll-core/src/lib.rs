#![warn(missing_docs)]
//! # zkpayroll-core
//!
//! ## Purpose
//! Defines the pure payroll data model shared across the `zkpayroll` workspace.
//!
//! ## Responsibilities
//! - Represent employees and the employer's roster of them.
//! - Split gross salaries into net salary and withheld tax.
//! - Decide when a wallet screening has gone stale.
//! - Derive opaque salary commitments and stable payment references.
//!
//! ## Data flow
//! Registration input -> [`Roster::add`] -> screening updates via
//! [`Roster::update_screening`] -> payment time [`split_salary`] feeds the
//! settlement legs.
//!
//! ## Ownership and lifetimes
//! Roster entries own their strings so the roster can be serialized and
//! handed across request boundaries without borrowing request buffers.
//!
//! ## Error model
//! Validation failures (field lengths, duplicate ids, tax rate bounds) return
//! [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! Salaries never leave this crate in clear form except through the roster
//! owned by the employer. [`salary_commitment`] is one-way.
//!
//! ## Example
//! ```rust
//! use zkpayroll_core::split_salary;
//!
//! let split = split_salary(10_000, 500).expect("valid split");
//! assert_eq!(split.tax, 500);
//! assert_eq!(split.net, 9_500);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Maximum employee id length in bytes accepted by the payroll program.
pub const MAX_EMPLOYEE_ID_LEN: usize = 64;

/// Maximum employee name length in bytes accepted by the payroll program.
pub const MAX_EMPLOYEE_NAME_LEN: usize = 128;

/// Basis points representing a 100 % tax rate.
pub const MAX_TAX_RATE_BPS: u16 = 10_000;

/// Default payroll tax rate (5 %).
pub const DEFAULT_TAX_RATE_BPS: u16 = 500;

/// Screening validity window in seconds (24 hours).
pub const SCREENING_VALIDITY_SECONDS: i64 = 86_400;

const COMMITMENT_DOMAIN: &[u8] = b"zkpayroll.salary-commitment.v1";
const PAYMENT_REFERENCE_DOMAIN: &[u8] = b"zkpayroll.payment-reference.v1";

/// One employee as tracked by the employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Employer-assigned identifier, unique within a roster.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Wallet address receiving net salary.
    pub wallet: String,
    /// Gross salary in token smallest units. Zero when only a commitment is known.
    pub salary: u64,
    /// Latest risk score (1 = safest, 10 = most dangerous).
    #[serde(default)]
    pub screening_score: Option<u8>,
    /// Unix seconds of the latest screening.
    pub last_screened: i64,
    /// Whether the employee may currently be paid.
    pub is_active: bool,
    /// Confidential settlement account, when one has been provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidential_account: Option<String>,
}

impl Employee {
    /// Constructs a validated, active employee with no screening history.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidEmployee`] for blank ids/names/wallets and
    /// [`CoreError::FieldTooLong`] when ids or names exceed program limits.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        wallet: impl Into<String>,
        salary: u64,
    ) -> Result<Self, CoreError> {
        let employee = Self {
            id: id.into(),
            name: name.into(),
            wallet: wallet.into(),
            salary,
            screening_score: None,
            last_screened: 0,
            is_active: true,
            confidential_account: None,
        };
        employee.validate()?;
        Ok(employee)
    }

    /// Checks field constraints enforced by the payroll program.
    ///
    /// # Errors
    /// See [`Employee::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::InvalidEmployee("employee id is empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidEmployee("employee name is empty".to_string()));
        }
        if self.wallet.trim().is_empty() {
            return Err(CoreError::InvalidEmployee("wallet address is empty".to_string()));
        }
        if self.id.len() > MAX_EMPLOYEE_ID_LEN {
            return Err(CoreError::FieldTooLong {
                field: "employee_id",
                max: MAX_EMPLOYEE_ID_LEN,
                actual: self.id.len(),
            });
        }
        if self.name.len() > MAX_EMPLOYEE_NAME_LEN {
            return Err(CoreError::FieldTooLong {
                field: "name",
                max: MAX_EMPLOYEE_NAME_LEN,
                actual: self.name.len(),
            });
        }
        Ok(())
    }
}

/// Employer-owned collection of employees keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    employees: Vec<Employee>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one employee.
    ///
    /// # Errors
    /// Returns [`CoreError::DuplicateEmployee`] when the id is already present,
    /// or any validation error from [`Employee::validate`].
    pub fn add(&mut self, employee: Employee) -> Result<(), CoreError> {
        employee.validate()?;
        if self.get(&employee.id).is_some() {
            return Err(CoreError::DuplicateEmployee(employee.id));
        }
        self.employees.push(employee);
        Ok(())
    }

    /// Returns the employee with `id`, if present.
    pub fn get(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|employee| employee.id == id)
    }

    /// Records a fresh screening outcome.
    ///
    /// # Side effects
    /// Employees whose risk score exceeds `max_risk_score` are deactivated.
    /// A passing score never reactivates an employee; that is an explicit
    /// employer action.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownEmployee`] when `id` is not in the roster.
    pub fn update_screening(
        &mut self,
        id: &str,
        risk_score: u8,
        screened_at: i64,
        max_risk_score: u8,
    ) -> Result<&Employee, CoreError> {
        let employee = self.get_mut(id)?;
        employee.screening_score = Some(risk_score);
        employee.last_screened = screened_at;
        if risk_score > max_risk_score {
            employee.is_active = false;
        }
        Ok(employee)
    }

    /// Marks an employee inactive.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownEmployee`] when `id` is not in the roster.
    pub fn deactivate(&mut self, id: &str) -> Result<(), CoreError> {
        self.get_mut(id)?.is_active = false;
        Ok(())
    }

    /// Removes and returns an employee.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownEmployee`] when `id` is not in the roster.
    pub fn remove(&mut self, id: &str) -> Result<Employee, CoreError> {
        let index = self
            .employees
            .iter()
            .position(|employee| employee.id == id)
            .ok_or_else(|| CoreError::UnknownEmployee(id.to_string()))?;
        Ok(self.employees.remove(index))
    }

    /// Case-insensitive search across name, id, and wallet.
    pub fn search(&self, term: &str) -> Vec<&Employee> {
        let needle = term.to_lowercase();
        self.employees
            .iter()
            .filter(|employee| {
                employee.name.to_lowercase().contains(&needle)
                    || employee.id.to_lowercase().contains(&needle)
                    || employee.wallet.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Returns all employees in insertion order.
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Returns the number of employees.
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Returns `true` when the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Serializes the roster to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Deserializes and re-validates a roster from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] for invalid JSON and validation errors for
    /// entries that violate roster invariants.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        let decoded: Roster = serde_json::from_slice(raw).map_err(CoreError::Codec)?;
        let mut roster = Roster::new();
        for employee in decoded.employees {
            roster.add(employee)?;
        }
        Ok(roster)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Employee, CoreError> {
        self.employees
            .iter_mut()
            .find(|employee| employee.id == id)
            .ok_or_else(|| CoreError::UnknownEmployee(id.to_string()))
    }
}

/// Gross salary divided into the two settlement legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalarySplit {
    /// Gross salary in smallest units.
    pub gross: u64,
    /// Withheld tax sent to the tax authority.
    pub tax: u64,
    /// Net salary sent to the employee.
    pub net: u64,
}

/// Splits `gross` into tax and net salary at `tax_rate_bps`.
///
/// Tax is rounded down, so `tax + net == gross` always holds.
///
/// # Errors
/// Returns [`CoreError::InvalidAmount`] when `gross == 0` and
/// [`CoreError::InvalidTaxRate`] when the rate exceeds 100 %.
pub fn split_salary(gross: u64, tax_rate_bps: u16) -> Result<SalarySplit, CoreError> {
    if gross == 0 {
        return Err(CoreError::InvalidAmount);
    }
    if tax_rate_bps > MAX_TAX_RATE_BPS {
        return Err(CoreError::InvalidTaxRate(tax_rate_bps));
    }

    let tax = (gross as u128 * tax_rate_bps as u128 / MAX_TAX_RATE_BPS as u128) as u64;
    Ok(SalarySplit {
        gross,
        tax,
        net: gross - tax,
    })
}

/// Returns `true` when a screening taken at `last_screened` is older than
/// `validity_seconds` at `now`.
pub fn is_screening_expired(last_screened: i64, now: i64, validity_seconds: i64) -> bool {
    now.saturating_sub(last_screened) > validity_seconds
}

/// Derives the opaque 32-byte commitment stored on-chain in place of a salary.
pub fn salary_commitment(employee_id: &str, salary: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(COMMITMENT_DOMAIN);
    hasher.update((employee_id.len() as u32).to_le_bytes());
    hasher.update(employee_id.as_bytes());
    hasher.update(salary.to_le_bytes());
    hasher.finalize().into()
}

/// Stable hex reference for one payment attempt of one employee.
pub fn payment_reference(employee_id: &str, timestamp: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(PAYMENT_REFERENCE_DOMAIN);
    hasher.update((employee_id.len() as u32).to_le_bytes());
    hasher.update(employee_id.as_bytes());
    hasher.update(timestamp.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Error type for payroll model validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Employee fields are blank or otherwise unusable.
    #[error("invalid employee: {0}")]
    InvalidEmployee(String),
    /// A string field exceeds the payroll program limit.
    #[error("{field} exceeds maximum length of {max} bytes (got {actual})")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum byte length.
        max: usize,
        /// Actual byte length.
        actual: usize,
    },
    /// Employee id already present in the roster.
    #[error("employee already registered: {0}")]
    DuplicateEmployee(String),
    /// Employee id not present in the roster.
    #[error("unknown employee: {0}")]
    UnknownEmployee(String),
    /// Amount must be strictly positive.
    #[error("invalid amount: must be greater than zero")]
    InvalidAmount,
    /// Tax rate above 100 %.
    #[error("tax rate cannot exceed 10000 basis points (got {0})")]
    InvalidTaxRate(u16),
    /// JSON encoding/decoding error.
    #[error("roster codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
