//! Shared fixtures for account layout tests.

use zkpayroll_accounts::{Address, EmployeeAccountRecord, encode_employee_account};
use zkpayroll_core::salary_commitment;

/// Payroll account shared by every fixture record.
#[allow(dead_code)]
pub const PAYROLL: Address = Address([9; 32]);

/// Creates a deterministic record for fixture index `seed`.
#[allow(dead_code)]
pub fn fixture_record(seed: u8) -> EmployeeAccountRecord {
    let employee_id = format!("EMP{seed:03}");
    EmployeeAccountRecord {
        payroll: PAYROLL,
        salary_commitment: salary_commitment(&employee_id, 5_000 + seed as u64),
        employee_id,
        name: format!("Employee {seed}"),
        wallet_address: Address([seed; 32]),
        salary: 0,
        screening_score: seed % 10 + 1,
        last_screened: 1_700_000_000 + seed as i64,
        is_active: seed % 2 == 0,
        confidential_account: Address([seed.wrapping_add(100); 32]),
    }
}

/// Encodes the fixture record for `seed`.
#[allow(dead_code)]
pub fn fixture_buffer(seed: u8) -> Vec<u8> {
    encode_employee_account(&fixture_record(seed)).expect("fixture should encode")
}
