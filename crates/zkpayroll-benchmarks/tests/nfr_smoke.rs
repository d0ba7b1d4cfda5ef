//! Benchmark smoke test for account decoding and screening normalization.

use std::time::Instant;

use zkpayroll_accounts::{
    Address, EmployeeAccountRecord, decode_employee_accounts, encode_employee_account,
};
use zkpayroll_core::salary_commitment;
use zkpayroll_screening_contract::{normalize_assessment, parse_risk_assessment};

fn fixture_buffers(count: u16) -> Vec<Vec<u8>> {
    (0..count)
        .map(|index| {
            let seed = (index % 251) as u8;
            let employee_id = format!("EMP{index:05}");
            let record = EmployeeAccountRecord {
                payroll: Address([7; 32]),
                salary_commitment: salary_commitment(&employee_id, 1_000 + u64::from(index)),
                employee_id,
                name: format!("Employee {index}"),
                wallet_address: Address([seed; 32]),
                salary: 0,
                screening_score: seed % 10 + 1,
                last_screened: 1_700_000_000,
                is_active: true,
                confidential_account: Address([seed.wrapping_add(1); 32]),
            };
            encode_employee_account(&record).expect("record should encode")
        })
        .collect()
}

#[test]
fn benchmark_decode_and_normalize_smoke_prints_latency() {
    let buffers = fixture_buffers(1_000);
    let raw = r#"{"riskScore":4,"riskLevel":"Medium risk","numHops":3,"maliciousAddressesFound":[],"reasoning":"indirect exposure"}"#;

    let start = Instant::now();
    let mut decoded = 0usize;
    let mut flagged = 0usize;

    for _ in 0..20 {
        decoded += decode_employee_accounts(&buffers).len();
        for record in decode_employee_accounts(buffers.iter().take(50)) {
            let assessment = parse_risk_assessment(raw).expect("assessment should parse");
            let result = normalize_assessment(&record.wallet_address.to_string(), &assessment);
            flagged += usize::from(result.flagged);
        }
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_decode_normalize_elapsed_ms={elapsed_ms}");
    println!("benchmark_decoded_records={decoded} flagged={flagged}");

    assert_eq!(decoded, 20_000);
    assert_eq!(flagged, 0);
    assert!(
        elapsed_ms < 5_000,
        "decode/normalize smoke benchmark should stay bounded"
    );
}
