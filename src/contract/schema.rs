use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;

/// Disable real schema validation and pass every document.
pub const NO_VALIDATE_ENV: &str = "WF_HOOKS_NO_VALIDATE";

/// Resolves a contract name to a loaded schema document. Tries
/// `<name>.yaml` first, then `<name>.json`; anything unreadable or
/// unparseable counts as "not found" and never raises.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    dir: PathBuf,
}

impl SchemaStore {
    pub fn new(dir: PathBuf) -> Self {
        SchemaStore { dir }
    }

    pub fn load(&self, contract: &str) -> Option<Value> {
        let yaml_path = self.dir.join(format!("{contract}.yaml"));
        if let Ok(text) = fs::read_to_string(&yaml_path) {
            return serde_yaml::from_str(&text).ok();
        }

        let json_path = self.dir.join(format!("{contract}.json"));
        let text = fs::read_to_string(&json_path).ok()?;
        serde_json::from_str(&text).ok()
    }
}

/// One schema violation, flattened for display and the stderr diagnostic.
/// `field` is the dotted instance path, or `(root)` for whole-document
/// errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaViolation {
    pub field: String,
    pub expected: String,
    pub actual: String,
    pub message: String,
}

/// Validation strategy seam: the real jsonschema-backed engine, or a
/// permissive pass-through selected at startup.
pub trait SchemaEngine {
    fn check(&self, schema: &Value, instance: &Value) -> Result<Vec<SchemaViolation>>;
}

pub fn select_engine() -> Box<dyn SchemaEngine> {
    let disabled = env::var(NO_VALIDATE_ENV)
        .map(|flag| !flag.trim().is_empty())
        .unwrap_or(false);
    if disabled {
        Box::new(PermissiveEngine)
    } else {
        Box::new(JsonSchemaEngine)
    }
}

pub struct JsonSchemaEngine;

impl SchemaEngine for JsonSchemaEngine {
    fn check(&self, schema: &Value, instance: &Value) -> Result<Vec<SchemaViolation>> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|err| anyhow!("schema does not compile: {err}"))?;
        Ok(validator
            .iter_errors(instance)
            .map(|err| violation_detail(schema, &err))
            .collect())
    }
}

/// Pass-through used when validation is switched off; every document is
/// accepted.
pub struct PermissiveEngine;

impl SchemaEngine for PermissiveEngine {
    fn check(&self, _schema: &Value, _instance: &Value) -> Result<Vec<SchemaViolation>> {
        Ok(Vec::new())
    }
}

fn violation_detail(schema: &Value, err: &jsonschema::ValidationError<'_>) -> SchemaViolation {
    let keyword_path = err.schema_path().to_string();
    let (subschema_pointer, keyword) = match keyword_path.rfind('/') {
        Some(split) => (&keyword_path[..split], &keyword_path[split + 1..]),
        None => ("", keyword_path.as_str()),
    };
    // Prefer the declared `type` of the failing subschema; fall back to the
    // violated keyword.
    let expected = schema
        .pointer(subschema_pointer)
        .and_then(|subschema| subschema.get("type"))
        .map(type_label)
        .unwrap_or_else(|| keyword.to_string());

    SchemaViolation {
        field: dotted_path(&err.instance_path().to_string()),
        expected,
        actual: json_type_name(err.instance().as_ref()).to_string(),
        message: err.to_string(),
    }
}

fn dotted_path(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        "(root)".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

fn type_label(declared: &Value) -> String {
    match declared {
        Value::String(name) => name.clone(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.to_string(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_mismatch_reports_declared_type_and_runtime_type() {
        let schema = json!({
            "type": "object",
            "properties": { "total": { "type": "number" } },
            "required": ["total"]
        });
        let errors = JsonSchemaEngine
            .check(&schema, &json!({ "total": "abc" }))
            .expect("schema compiles");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "total");
        assert_eq!(errors[0].expected, "number");
        assert_eq!(errors[0].actual, "string");
    }

    #[test]
    fn root_errors_use_the_root_marker() {
        let schema = json!({ "type": "object" });
        let errors = JsonSchemaEngine
            .check(&schema, &json!("not an object"))
            .expect("schema compiles");
        assert_eq!(errors[0].field, "(root)");
        assert_eq!(errors[0].expected, "object");
    }

    #[test]
    fn permissive_engine_accepts_anything() {
        let schema = json!({ "type": "object" });
        let errors = PermissiveEngine.check(&schema, &json!(42)).expect("ok");
        assert!(errors.is_empty());
    }
}
