//! Validates contract fixtures and serialized results against frozen JSON schemas.

use jsonschema::JSONSchema;
use serde_json::Value;
use zkpayroll_screening_contract::{
    Provenance, ScreenResponse, ScreeningResult, normalize_assessment, parse_risk_assessment,
};

const ADDRESS: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

fn contract_path(relative: &str) -> String {
    format!("{}/../../contracts/{relative}", env!("CARGO_MANIFEST_DIR"))
}

fn load_json(relative: &str) -> Value {
    let raw = std::fs::read_to_string(contract_path(relative)).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema: &str) -> JSONSchema {
    JSONSchema::compile(&load_json(schema)).expect("schema should compile")
}

fn assert_response_valid(response: &Value) {
    let envelope = compile_validator("screen-response.schema.json");
    let result = compile_validator("screening-result.schema.json");
    assert!(envelope.is_valid(response), "envelope should validate: {response}");
    if let Some(data) = response.get("data") {
        assert!(result.is_valid(data), "result should validate: {data}");
    }
}

#[test]
fn screen_response_fixtures_match_schema() {
    assert_response_valid(&load_json("fixtures/screen-response.valid.json"));
    assert_response_valid(&load_json("fixtures/screen-response.fallback.json"));
}

#[test]
fn invalid_screen_response_fixture_is_rejected() {
    let validator = compile_validator("screening-result.schema.json");
    let fixture = load_json("fixtures/screen-response.invalid.json");
    assert!(!validator.is_valid(&fixture["data"]));
}

#[test]
fn risk_assessment_fixture_matches_schema_and_normalizes() {
    let validator = compile_validator("risk-assessment.schema.json");
    let fixture = load_json("fixtures/risk-assessment.valid.json");
    assert!(validator.is_valid(&fixture));

    let assessment =
        parse_risk_assessment(&fixture.to_string()).expect("fixture should parse as assessment");
    let result = normalize_assessment(ADDRESS, &assessment);
    assert!(result.flagged);
    assert!(result.sanctioned);
    assert_eq!(result.malicious_addresses.len(), 2);

    let response = serde_json::to_value(ScreenResponse::ok(result)).expect("response should serialize");
    assert_response_valid(&response);
}

#[test]
fn serialized_synthetic_results_match_schema() {
    for result in [
        ScreeningResult::synthetic(ADDRESS, 7, Provenance::Fallback, Some(503)),
        ScreeningResult::synthetic(ADDRESS, 1, Provenance::Mock, None),
        ScreeningResult::error_default(ADDRESS),
    ] {
        let response = serde_json::to_value(ScreenResponse::ok(result)).expect("response should serialize");
        assert_response_valid(&response);
    }
}

#[test]
fn failure_envelope_matches_schema() {
    let response = serde_json::to_value(ScreenResponse::failure("Wallet address is required"))
        .expect("response should serialize");
    assert_response_valid(&response);
}
