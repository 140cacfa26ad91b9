use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;
use wf_hooks_rs::contract::{CheckKind, ContractValidator, Outcome};
use wf_hooks_rs::envelope::{HookResponse, ToolPayload};

fn contracts_fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let contracts = dir.path().join("contracts");
    fs::create_dir_all(&contracts).expect("contracts dir");
    let mapping = [
        "version: \"1.0\"",
        "nodes:",
        "  build:",
        "    input: build-input",
        "    output: build-output",
        "  report:",
        "    output: missing-contract",
        "  prose-only: {}",
        "",
    ]
    .join("\n");
    fs::write(contracts.join("mapping.yaml"), mapping).expect("mapping");
    let output_schema = [
        "type: object",
        "properties:",
        "  total:",
        "    type: number",
        "required:",
        "  - total",
        "",
    ]
    .join("\n");
    fs::write(contracts.join("build-output.yaml"), output_schema).expect("output schema");
    fs::write(
        contracts.join("build-input.json"),
        serde_json::to_string(&json!({
            "type": "object",
            "properties": { "target": { "type": "string" } },
            "required": ["target"]
        }))
        .expect("encode"),
    )
    .expect("input schema");
    (dir, contracts)
}

fn payload(value: serde_json::Value) -> ToolPayload {
    ToolPayload::from_value(Some(value))
}

#[test]
fn unmapped_step_is_skipped() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let outcome = validator.validate(
        CheckKind::Output,
        "fetch",
        "",
        &payload(json!({ "result": "{}" })),
    );
    assert!(matches!(outcome, Outcome::Skipped(_)));
}

#[test]
fn unset_contract_slot_is_skipped() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let outcome = validator.validate(
        CheckKind::Input,
        "prose-only",
        "{\"anything\": 1}",
        &ToolPayload::Absent,
    );
    assert!(matches!(outcome, Outcome::Skipped(_)));
}

#[test]
fn missing_schema_document_is_skipped_not_failed() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let outcome = validator.validate(
        CheckKind::Output,
        "report",
        "",
        &payload(json!({ "result": "{}" })),
    );
    assert!(matches!(outcome, Outcome::Skipped(_)));
}

#[test]
fn type_violation_in_stringified_result_fails_with_detail() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let outcome = validator.validate(
        CheckKind::Output,
        "build",
        "",
        &payload(json!({ "result": "{\"total\": \"abc\"}" })),
    );
    let Outcome::Fail {
        contract, errors, ..
    } = outcome
    else {
        panic!("expected failure");
    };
    assert_eq!(contract, "build-output");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "total");
    assert_eq!(errors[0].expected, "number");
    assert_eq!(errors[0].actual, "string");
}

#[test]
fn passing_output_returns_pass() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let outcome = validator.validate(
        CheckKind::Output,
        "build",
        "",
        &payload(json!({ "result": { "total": 42 } })),
    );
    assert_eq!(outcome, Outcome::Pass);
}

#[test]
fn validation_is_deterministic() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let result = payload(json!({ "result": "{\"other\": true}" }));
    let first = validator.validate(CheckKind::Output, "build", "", &result);
    let second = validator.validate(CheckKind::Output, "build", "", &result);
    assert_eq!(first, second);
}

#[test]
fn proseless_input_is_advisory_skip_but_empty_output_fails() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);

    let input = validator.validate(
        CheckKind::Input,
        "build",
        "just build the project, no payload here",
        &ToolPayload::Absent,
    );
    assert!(matches!(input, Outcome::Skipped(_)));

    let output = validator.validate(CheckKind::Output, "build", "", &ToolPayload::Absent);
    let Outcome::Fail { errors, .. } = output else {
        panic!("expected failure for missing output");
    };
    assert_eq!(errors[0].field, "(root)");
    assert_eq!(errors[0].actual, "absent");
}

#[test]
fn input_prompt_with_embedded_json_is_validated() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let prompt = "Build it with these parameters:\n```json\n{\"target\": 7}\n```";
    let outcome = validator.validate(CheckKind::Input, "build", prompt, &ToolPayload::Absent);
    let Outcome::Fail { suggestion, .. } = outcome else {
        panic!("expected failure");
    };
    assert!(suggestion.contains("target"));
}

#[test]
fn required_violation_synthesizes_add_field_suggestion() {
    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::new(contracts);
    let outcome = validator.validate(
        CheckKind::Output,
        "build",
        "",
        &payload(json!({ "result": { "other": 1 } })),
    );
    let Outcome::Fail { suggestion, .. } = outcome else {
        panic!("expected failure");
    };
    assert!(
        suggestion.contains("add missing required field 'total'")
            || suggestion.contains("add missing required field '(root)'"),
        "unexpected suggestion: {suggestion}"
    );
}

#[test]
fn only_output_checks_block() {
    assert!(CheckKind::Output.blocks_on_failure());
    assert!(!CheckKind::Input.blocks_on_failure());

    let deny = HookResponse::deny("output contract violated");
    assert!(deny.is_deny());
    let advisory = HookResponse::message("input contract violated");
    assert!(!advisory.is_deny());

    let envelope = serde_json::to_value(&deny).expect("serialize");
    assert_eq!(envelope["continue"], json!(true));
    assert_eq!(
        envelope["hookSpecificOutput"]["permissionDecision"],
        json!("deny")
    );
}

#[test]
fn permissive_engine_passes_violating_data() {
    use wf_hooks_rs::contract::schema::PermissiveEngine;

    let (_dir, contracts) = contracts_fixture();
    let validator = ContractValidator::with_engine(contracts, Box::new(PermissiveEngine));
    let outcome = validator.validate(
        CheckKind::Output,
        "build",
        "",
        &payload(json!({ "result": "{\"total\": \"abc\"}" })),
    );
    assert_eq!(outcome, Outcome::Pass);
}

#[test]
fn missing_mapping_file_skips_everything() {
    let dir = TempDir::new().expect("tempdir");
    let validator = ContractValidator::new(dir.path().join("nonexistent"));
    let outcome = validator.validate(
        CheckKind::Output,
        "build",
        "",
        &payload(json!({ "result": "{}" })),
    );
    assert!(matches!(outcome, Outcome::Skipped(_)));
}
