use std::io::Read;

use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// One hook event envelope as delivered by the host on stdin.
///
/// The envelope is duck-typed on the wire; every field is resolved once
/// here so the engines downstream never touch raw JSON shapes.
#[derive(Debug, Clone)]
pub struct HookEvent {
    /// `hook_event_name`: UserPromptSubmit, PreToolUse, PostToolUse or Stop.
    pub event: String,
    pub tool_name: String,
    /// Step name carried as `tool_input.subagent_type` on Task invocations.
    pub node: Option<String>,
    /// Instruction text handed to the step (`tool_input.prompt`).
    pub prompt: String,
    /// Raw user input on UserPromptSubmit events.
    pub user_prompt: String,
    pub tool_result: ToolPayload,
}

impl HookEvent {
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut buffer = String::new();
        reader
            .read_to_string(&mut buffer)
            .context("failed to read event envelope")?;
        let value: Value =
            serde_json::from_str(&buffer).context("invalid JSON event envelope")?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let tool_input = value.get("tool_input");
        HookEvent {
            event: string_field(value, "hook_event_name"),
            tool_name: string_field(value, "tool_name"),
            node: tool_input
                .and_then(|input| input.get("subagent_type"))
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            prompt: tool_input
                .and_then(|input| input.get("prompt"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            user_prompt: value
                .get("prompt")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            tool_result: ToolPayload::from_value(value.get("tool_result").cloned()),
        }
    }

    /// Both engines only act on Task tool invocations.
    pub fn is_task(&self) -> bool {
        self.tool_name == "Task"
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// A tool result resolved into its payload shape at the boundary.
///
/// Empty or otherwise vacuous results (null, false, 0, "", {}, []) collapse
/// into `Absent`, matching how the host reports steps with no output.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    Structured(Map<String, Value>),
    Text(String),
    Other(Value),
    Absent,
}

impl ToolPayload {
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => ToolPayload::Absent,
            Some(Value::Number(number)) => {
                if number.as_f64() == Some(0.0) {
                    ToolPayload::Absent
                } else {
                    ToolPayload::Other(Value::Number(number))
                }
            }
            Some(Value::String(text)) => {
                if text.is_empty() {
                    ToolPayload::Absent
                } else {
                    ToolPayload::Text(text)
                }
            }
            Some(Value::Array(items)) => {
                if items.is_empty() {
                    ToolPayload::Absent
                } else {
                    ToolPayload::Other(Value::Array(items))
                }
            }
            Some(Value::Object(map)) => {
                if map.is_empty() {
                    ToolPayload::Absent
                } else {
                    ToolPayload::Structured(map)
                }
            }
            Some(other) => ToolPayload::Other(other),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ToolPayload::Absent)
    }
}

/// Extract a workflow name from a user prompt of the form `/name [args...]`.
pub fn workflow_command(prompt: &str) -> Option<&str> {
    prompt.strip_prefix('/')?.split_whitespace().next()
}

/// Response envelope printed on stdout. `continue` is always true; a deny
/// decision travels in `hookSpecificOutput`, never by halting the host.
#[derive(Debug, Clone, Serialize)]
pub struct HookResponse {
    #[serde(rename = "continue")]
    pub proceed: bool,
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_output: Option<HookSpecificOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookSpecificOutput {
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,
}

impl HookResponse {
    pub fn allow() -> Self {
        HookResponse {
            proceed: true,
            system_message: None,
            hook_output: None,
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        HookResponse {
            proceed: true,
            system_message: Some(text.into()),
            hook_output: None,
        }
    }

    pub fn deny(text: impl Into<String>) -> Self {
        HookResponse {
            proceed: true,
            system_message: Some(text.into()),
            hook_output: Some(HookSpecificOutput {
                permission_decision: "deny".to_string(),
            }),
        }
    }

    pub fn is_deny(&self) -> bool {
        self.hook_output
            .as_ref()
            .is_some_and(|output| output.permission_decision == "deny")
    }

    pub fn emit(&self) -> Result<()> {
        let serialized = serde_json::to_string(self)?;
        println!("{serialized}");
        Ok(())
    }
}
