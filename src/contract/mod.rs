pub mod mapping;
pub mod schema;

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::envelope::ToolPayload;
use crate::extract;
use mapping::MappingTable;
use schema::{SchemaEngine, SchemaStore, SchemaViolation};

/// Which side of a step invocation is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Input,
    Output,
}

impl CheckKind {
    pub fn from_event(event: &str) -> Option<Self> {
        match event {
            "PreToolUse" => Some(CheckKind::Input),
            "PostToolUse" => Some(CheckKind::Output),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Input => "input",
            CheckKind::Output => "output",
        }
    }

    /// Only output violations deny continuation; input checks are advisory.
    pub fn blocks_on_failure(&self) -> bool {
        matches!(self, CheckKind::Output)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one contract check.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Configuration incomplete; never blocks.
    Skipped(String),
    Pass,
    Fail {
        contract: String,
        errors: Vec<SchemaViolation>,
        suggestion: String,
    },
}

/// Validates one step invocation's data against its declared contract.
pub struct ContractValidator {
    mapping: MappingTable,
    store: SchemaStore,
    engine: Box<dyn SchemaEngine>,
}

impl ContractValidator {
    pub fn new(contracts_dir: PathBuf) -> Self {
        let mapping = MappingTable::load(&contracts_dir.join("mapping.yaml"));
        ContractValidator {
            mapping,
            store: SchemaStore::new(contracts_dir),
            engine: schema::select_engine(),
        }
    }

    pub fn with_engine(contracts_dir: PathBuf, engine: Box<dyn SchemaEngine>) -> Self {
        let mapping = MappingTable::load(&contracts_dir.join("mapping.yaml"));
        ContractValidator {
            mapping,
            store: SchemaStore::new(contracts_dir),
            engine,
        }
    }

    pub fn validate(
        &self,
        check: CheckKind,
        node: &str,
        prompt: &str,
        result: &ToolPayload,
    ) -> Outcome {
        let Some(entry) = self.mapping.node(node) else {
            return Outcome::Skipped(format!("no contract mapping for step '{node}'"));
        };

        let slot = match check {
            CheckKind::Input => entry.input.as_deref(),
            CheckKind::Output => entry.output.as_deref(),
        };
        let Some(contract) = slot else {
            return Outcome::Skipped(format!(
                "step '{node}' has no {check} contract configured"
            ));
        };

        let Some(schema_doc) = self.store.load(contract) else {
            return Outcome::Skipped(format!("contract '{contract}' not found"));
        };

        let Some(data) = candidate_data(check, prompt, result) else {
            return match check {
                // Step inputs are often prose; nothing extractable is fine.
                CheckKind::Input => Outcome::Skipped(format!(
                    "no structured data found in step '{node}' input"
                )),
                // An executed step with no recognizable structured output
                // violates its output contract by definition.
                CheckKind::Output => {
                    let errors = vec![SchemaViolation {
                        field: "(root)".to_string(),
                        expected: format!("structured data matching contract '{contract}'"),
                        actual: "absent".to_string(),
                        message: "no structured data found in step output".to_string(),
                    }];
                    let suggestion = suggest(&errors);
                    Outcome::Fail {
                        contract: contract.to_string(),
                        errors,
                        suggestion,
                    }
                }
            };
        };

        let errors = match self.engine.check(&schema_doc, &data) {
            Ok(errors) => errors,
            Err(err) => {
                return Outcome::Skipped(format!("contract '{contract}' unusable: {err}"))
            }
        };

        if errors.is_empty() {
            Outcome::Pass
        } else {
            let suggestion = suggest(&errors);
            Outcome::Fail {
                contract: contract.to_string(),
                errors,
                suggestion,
            }
        }
    }
}

/// Pick the document to validate. Input checks mine the instruction text;
/// output checks probe structured results for the usual payload fields
/// before falling back to text extraction.
fn candidate_data(check: CheckKind, prompt: &str, result: &ToolPayload) -> Option<Value> {
    match check {
        CheckKind::Input => extract::json_from_text(prompt),
        CheckKind::Output => match result {
            ToolPayload::Structured(map) => {
                for field in ["result", "output", "data", "content"] {
                    if let Some(value) = map.get(field) {
                        return match value {
                            Value::String(text) => extract::json_from_text(text),
                            other => Some(other.clone()),
                        };
                    }
                }
                Some(Value::Object(map.clone()))
            }
            ToolPayload::Text(text) => extract::json_from_text(text),
            ToolPayload::Other(value) => Some(value.clone()),
            ToolPayload::Absent => None,
        },
    }
}

/// One remediation phrase per error, first three errors only.
pub fn suggest(errors: &[SchemaViolation]) -> String {
    let mut phrases = Vec::new();
    for error in errors.iter().take(3) {
        let lowered = error.message.to_lowercase();
        let phrase = if lowered.contains("required") {
            format!("add missing required field '{}'", error.field)
        } else if lowered.contains("type") {
            format!("change type of field '{}' to {}", error.field, error.expected)
        } else if lowered.contains("minimum")
            || lowered.contains("minlength")
            || lowered.contains("shorter than")
        {
            format!(
                "field '{}' must satisfy a minimum length/value constraint",
                error.field
            )
        } else {
            format!("fix field '{}': {}", error.field, error.message)
        };
        phrases.push(phrase);
    }
    phrases.join("; ")
}
