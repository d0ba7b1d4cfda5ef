//! Tests salary split arithmetic and screening expiry.

use zkpayroll_core::{
    CoreError, DEFAULT_TAX_RATE_BPS, SCREENING_VALIDITY_SECONDS, is_screening_expired,
    payment_reference, split_salary,
};

#[test]
fn salary_split_tests_default_rate_withholds_five_percent() {
    let split = split_salary(5_000_000_000, DEFAULT_TAX_RATE_BPS).expect("split");
    assert_eq!(split.tax, 250_000_000);
    assert_eq!(split.net, 4_750_000_000);
    assert_eq!(split.gross, 5_000_000_000);
}

#[test]
fn salary_split_tests_handles_extreme_values_without_overflow() {
    let split = split_salary(u64::MAX, 10_000).expect("split");
    assert_eq!(split.tax, u64::MAX);
    assert_eq!(split.net, 0);

    let untaxed = split_salary(42, 0).expect("split");
    assert_eq!(untaxed.tax, 0);
    assert_eq!(untaxed.net, 42);
}

#[test]
fn salary_split_tests_rejects_invalid_inputs() {
    assert!(matches!(split_salary(0, 500), Err(CoreError::InvalidAmount)));
    assert!(matches!(
        split_salary(1, 10_001),
        Err(CoreError::InvalidTaxRate(10_001))
    ));
}

#[test]
fn salary_split_tests_screening_expires_after_validity_window() {
    let screened = 1_000;
    assert!(!is_screening_expired(
        screened,
        screened + SCREENING_VALIDITY_SECONDS,
        SCREENING_VALIDITY_SECONDS
    ));
    assert!(is_screening_expired(
        screened,
        screened + SCREENING_VALIDITY_SECONDS + 1,
        SCREENING_VALIDITY_SECONDS
    ));
}

#[test]
fn salary_split_tests_payment_reference_is_stable_hex() {
    let a = payment_reference("EMP001", 1_700_000_000);
    let b = payment_reference("EMP001", 1_700_000_000);
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert_ne!(a, payment_reference("EMP001", 1_700_000_001));
}
