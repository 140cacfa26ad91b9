use std::fmt;

use serde::{Deserialize, Serialize};

/// Synthetic log node used for workflow-level events.
pub const WORKFLOW_NODE: &str = "workflow";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "⏳ pending",
            WorkflowStatus::Running => "🔄 running",
            WorkflowStatus::Completed => "✅ completed",
            WorkflowStatus::Failed => "❌ failed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl NodeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "⏳ pending",
            NodeStatus::Running => "🔄 running",
            NodeStatus::Completed => "✅ completed",
            NodeStatus::Failed => "❌ failed",
        }
    }
}

/// Lifecycle of one step. Entries keep first-start order.
#[derive(Debug, Clone)]
pub struct NodeState {
    pub name: String,
    pub status: NodeStatus,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    Start,
    Complete,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogEvent::Start => "start",
            LogEvent::Complete => "complete",
        })
    }
}

/// Append-only log line; `timestamp` is already in display form (HH:MM:SS).
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub node: String,
    pub event: LogEvent,
    pub timestamp: String,
    pub message: String,
}

/// The persisted aggregate: workflow-level scalars plus per-step detail and
/// log history for the current session.
#[derive(Debug, Clone, Default)]
pub struct StateRecord {
    pub workflow: String,
    pub status: WorkflowStatus,
    pub started_at: Option<String>,
    pub updated_at: Option<String>,
    pub completed_at: Option<String>,
    pub current_node: Option<String>,
    pub total_nodes: u64,
    pub completed_nodes: u64,
    pub nodes: Vec<NodeState>,
    pub logs: Vec<LogEntry>,
}

impl StateRecord {
    pub fn node(&self, name: &str) -> Option<&NodeState> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut NodeState> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    pub fn has_failed_node(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| node.status == NodeStatus::Failed)
    }

    pub fn push_log(
        &mut self,
        node: impl Into<String>,
        event: LogEvent,
        timestamp: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.logs.push(LogEntry {
            node: node.into(),
            event,
            timestamp: timestamp.into(),
            message: message.into(),
        });
    }
}
