#![warn(missing_docs)]
//! # zkpayroll-accounts
//!
//! ## Purpose
//! Decodes fixed-layout `Employee` program accounts into typed records.
//!
//! ## Responsibilities
//! - Read the Employee account layout field by field with a bounds-checked cursor.
//! - Decode batches of candidate accounts, omitting malformed ones.
//! - Write the same layout for fixtures and local tooling.
//!
//! ## Data flow
//! Program account query -> raw buffers -> [`decode_employee_accounts`] ->
//! [`EmployeeAccountRecord`] list -> roster projection via
//! [`EmployeeAccountRecord::into_employee`].
//!
//! ## Ownership and lifetimes
//! Decoded records own their strings; the cursor borrows the input buffer only
//! for the duration of one decode call.
//!
//! ## Error model
//! Single-buffer decoding returns [`AccountError`]. Batch decoding never fails:
//! malformed buffers are logged and skipped.
//!
//! ## Security and privacy notes
//! The salary commitment is carried as opaque bytes. Decoded records always
//! report a zero salary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zkpayroll_core::{Employee, MAX_EMPLOYEE_ID_LEN, MAX_EMPLOYEE_NAME_LEN};

/// Discriminator width at the start of every program account.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Byte offset of the payroll reference, used by account query filters.
pub const PAYROLL_OFFSET: usize = DISCRIMINATOR_LEN;

/// Byte offset of the employee id length prefix.
pub const EMPLOYEE_ID_OFFSET: usize = PAYROLL_OFFSET + 32;

/// Allocated size of an Employee account on-chain.
pub const EMPLOYEE_ACCOUNT_LEN: usize = DISCRIMINATOR_LEN
    + 32
    + 4
    + MAX_EMPLOYEE_ID_LEN
    + 4
    + MAX_EMPLOYEE_NAME_LEN
    + 32
    + 32
    + 1
    + 8
    + 1
    + 32
    + 1;

/// 32-byte account identifier rendered as base58.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Returns the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl FromStr for Address {
    type Err = AccountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(value)
            .into_vec()
            .map_err(|error| AccountError::InvalidAddress(error.to_string()))?;
        let bytes: [u8; 32] = decoded.as_slice().try_into().map_err(|_| {
            AccountError::InvalidAddress(format!("expected 32 bytes, decoded {}", decoded.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = AccountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Typed view of one Employee program account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAccountRecord {
    /// Owning payroll account.
    pub payroll: Address,
    /// Employer-assigned employee id.
    pub employee_id: String,
    /// Employee display name.
    pub name: String,
    /// Wallet receiving net salary.
    pub wallet_address: Address,
    /// Opaque salary commitment; never decoded into a number.
    pub salary_commitment: [u8; 32],
    /// Always `0`: the real salary is not stored in the account.
    pub salary: u64,
    /// Screening score recorded on-chain.
    pub screening_score: u8,
    /// Unix seconds of the recorded screening.
    pub last_screened: i64,
    /// Whether the employee can be paid.
    pub is_active: bool,
    /// Confidential settlement account.
    pub confidential_account: Address,
}

impl EmployeeAccountRecord {
    /// Projects the on-chain record into a roster entry with a zero salary.
    pub fn into_employee(self) -> Employee {
        Employee {
            id: self.employee_id,
            name: self.name,
            wallet: self.wallet_address.to_string(),
            salary: 0,
            screening_score: Some(self.screening_score),
            last_screened: self.last_screened,
            is_active: self.is_active,
            confidential_account: Some(self.confidential_account.to_string()),
        }
    }
}

/// Returns the account discriminator for `Employee` accounts.
pub fn employee_discriminator() -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(b"account:Employee");
    let mut discriminator = [0_u8; DISCRIMINATOR_LEN];
    discriminator.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    discriminator
}

/// Returns `true` when `buffer` belongs to `payroll` (offset-8 filter).
pub fn matches_payroll(buffer: &[u8], payroll: &Address) -> bool {
    buffer
        .get(PAYROLL_OFFSET..PAYROLL_OFFSET + 32)
        .is_some_and(|bytes| bytes == payroll.as_bytes())
}

/// Decodes one Employee account buffer.
///
/// # Errors
/// Returns [`AccountError::Truncated`] for out-of-bounds reads,
/// [`AccountError::LengthOutOfRange`] for string prefixes above program
/// limits, [`AccountError::InvalidUtf8`] for non-UTF-8 strings, and
/// [`AccountError::InvalidBool`] when the active flag is not 0 or 1.
pub fn decode_employee_account(buffer: &[u8]) -> Result<EmployeeAccountRecord, AccountError> {
    let mut cursor = AccountCursor::new(buffer);

    cursor.skip(DISCRIMINATOR_LEN, "discriminator")?;
    let payroll = Address(cursor.read_array("payroll")?);
    let employee_id = cursor.read_string("employee_id", MAX_EMPLOYEE_ID_LEN)?;
    let name = cursor.read_string("name", MAX_EMPLOYEE_NAME_LEN)?;
    let wallet_address = Address(cursor.read_array("wallet")?);
    let salary_commitment = cursor.read_array("salary_commitment")?;
    let screening_score = cursor.read_u8("screening_score")?;
    let last_screened = i64::from_le_bytes(cursor.read_array("last_screened")?);
    let is_active = match cursor.read_u8("is_active")? {
        0 => false,
        1 => true,
        other => return Err(AccountError::InvalidBool(other)),
    };
    let confidential_account = Address(cursor.read_array("confidential_account")?);

    Ok(EmployeeAccountRecord {
        payroll,
        employee_id,
        name,
        wallet_address,
        salary_commitment,
        salary: 0,
        screening_score,
        last_screened,
        is_active,
        confidential_account,
    })
}

/// Decodes a batch of candidate buffers, skipping malformed ones.
///
/// Each failure is logged with its batch index; the remaining buffers are
/// still decoded.
pub fn decode_employee_accounts<I, B>(buffers: I) -> Vec<EmployeeAccountRecord>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut records = Vec::new();
    for (index, buffer) in buffers.into_iter().enumerate() {
        match decode_employee_account(buffer.as_ref()) {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::warn!(
                    stage = "accounts",
                    action = "skip_record",
                    index,
                    len = buffer.as_ref().len(),
                    %error,
                    "failed to parse employee account"
                );
            }
        }
    }
    records
}

/// Writes `record` in the Employee account layout, zero-padded to
/// [`EMPLOYEE_ACCOUNT_LEN`].
///
/// The `salary` field is not part of the layout and is ignored.
///
/// # Errors
/// Returns [`AccountError::LengthOutOfRange`] when a string exceeds program
/// limits.
pub fn encode_employee_account(record: &EmployeeAccountRecord) -> Result<Vec<u8>, AccountError> {
    let mut out = Vec::with_capacity(EMPLOYEE_ACCOUNT_LEN);
    out.extend_from_slice(&employee_discriminator());
    out.extend_from_slice(record.payroll.as_bytes());
    write_string(&mut out, "employee_id", &record.employee_id, MAX_EMPLOYEE_ID_LEN)?;
    write_string(&mut out, "name", &record.name, MAX_EMPLOYEE_NAME_LEN)?;
    out.extend_from_slice(record.wallet_address.as_bytes());
    out.extend_from_slice(&record.salary_commitment);
    out.push(record.screening_score);
    out.extend_from_slice(&record.last_screened.to_le_bytes());
    out.push(u8::from(record.is_active));
    out.extend_from_slice(record.confidential_account.as_bytes());
    out.resize(EMPLOYEE_ACCOUNT_LEN, 0);
    Ok(out)
}

fn write_string(
    out: &mut Vec<u8>,
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), AccountError> {
    if value.len() > max {
        return Err(AccountError::LengthOutOfRange {
            field,
            len: value.len(),
            max,
        });
    }
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Forward-only reader over one account buffer.
struct AccountCursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> AccountCursor<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], AccountError> {
        let remaining = self.buffer.len().saturating_sub(self.offset);
        if len > remaining {
            return Err(AccountError::Truncated {
                field,
                offset: self.offset,
                needed: len,
                remaining,
            });
        }
        let bytes = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize, field: &'static str) -> Result<(), AccountError> {
        self.take(len, field).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], AccountError> {
        let mut array = [0_u8; N];
        array.copy_from_slice(self.take(N, field)?);
        Ok(array)
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8, AccountError> {
        Ok(self.take(1, field)?[0])
    }

    fn read_string(&mut self, field: &'static str, max: usize) -> Result<String, AccountError> {
        let len = u32::from_le_bytes(self.read_array(field)?) as usize;
        if len > max {
            return Err(AccountError::LengthOutOfRange { field, len, max });
        }
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| AccountError::InvalidUtf8 { field })
    }
}

/// Errors produced while reading or writing Employee accounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// A field extends past the end of the buffer.
    #[error("{field} at offset {offset} needs {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Field being read.
        field: &'static str,
        /// Cursor offset at the failed read.
        offset: usize,
        /// Bytes required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },
    /// A length prefix exceeds the program limit for its field.
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthOutOfRange {
        /// Field being read or written.
        field: &'static str,
        /// Declared length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// String bytes are not valid UTF-8.
    #[error("{field} is not valid utf-8")]
    InvalidUtf8 {
        /// Field being read.
        field: &'static str,
    },
    /// Boolean byte is neither 0 nor 1.
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),
    /// Address text is not a 32-byte base58 value.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
