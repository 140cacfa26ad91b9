pub mod classify;
pub mod record;
pub mod store;

use std::env;
use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{anyhow, Result};
use humantime::format_rfc3339_seconds;

use record::{LogEvent, NodeState, NodeStatus, StateRecord, WorkflowStatus, WORKFLOW_NODE};
use store::StateStore;

/// Select strict restart handling for already-running nodes.
pub const STRICT_RESTART_ENV: &str = "WF_STATE_STRICT_RESTART";

fn utc_now() -> String {
    format_rfc3339_seconds(SystemTime::now()).to_string()
}

/// HH:MM:SS slice of an ISO-8601 UTC timestamp, for display.
pub(crate) fn time_of_day(timestamp: &str) -> &str {
    timestamp.get(11..19).unwrap_or(timestamp)
}

/// What to do when `start_node` hits a step that is already running.
/// The default matches the historical behavior: warn and reset its
/// timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    #[default]
    WarnAndReset,
    Reject,
}

impl RestartPolicy {
    pub fn from_env() -> Self {
        let strict = env::var(STRICT_RESTART_ENV)
            .map(|flag| !flag.trim().is_empty())
            .unwrap_or(false);
        if strict {
            RestartPolicy::Reject
        } else {
            RestartPolicy::WarnAndReset
        }
    }
}

/// The workflow lifecycle state machine. All mutation goes through the four
/// named transitions; every transition persists before returning.
pub struct WorkflowState {
    record: StateRecord,
    store: StateStore,
    restart: RestartPolicy,
}

impl WorkflowState {
    pub fn open(path: PathBuf, restart: RestartPolicy) -> Self {
        let store = StateStore::new(path);
        let record = store.load();
        WorkflowState {
            record,
            store,
            restart,
        }
    }

    pub fn record(&self) -> &StateRecord {
        &self.record
    }

    pub fn start_workflow(&mut self, name: &str, total_nodes: u64) -> Result<()> {
        let now = utc_now();
        self.record.workflow = name.to_string();
        self.record.status = WorkflowStatus::Running;
        self.record.started_at = Some(now.clone());
        self.record.updated_at = Some(now.clone());
        self.record.total_nodes = total_nodes;
        self.record.completed_nodes = 0;
        self.record.current_node = None;
        self.record.push_log(
            WORKFLOW_NODE,
            LogEvent::Start,
            time_of_day(&now),
            format!("workflow '{name}' started"),
        );
        self.persist()
    }

    pub fn start_node(&mut self, name: &str) -> Result<()> {
        let now = utc_now();
        if let Some(node) = self.record.node(name) {
            if node.status == NodeStatus::Running {
                match self.restart {
                    RestartPolicy::WarnAndReset => {
                        eprintln!("wf-state: node '{name}' restarted while running, resetting")
                    }
                    RestartPolicy::Reject => {
                        return Err(anyhow!("node '{name}' is already running"))
                    }
                }
            }
        }

        self.record.current_node = Some(name.to_string());
        self.record.updated_at = Some(now.clone());
        self.record.status = WorkflowStatus::Running;

        if let Some(node) = self.record.node_mut(name) {
            node.status = NodeStatus::Running;
            node.started_at = Some(now.clone());
            node.completed_at = None;
            node.summary = None;
        } else {
            self.record.nodes.push(NodeState {
                name: name.to_string(),
                status: NodeStatus::Running,
                started_at: Some(now.clone()),
                completed_at: None,
                summary: None,
            });
        }

        self.record.push_log(
            name,
            LogEvent::Start,
            time_of_day(&now),
            format!("node '{name}' started"),
        );
        self.persist()
    }

    pub fn complete_node(&mut self, name: &str, success: bool, summary: &str) -> Result<()> {
        let now = utc_now();
        self.record.updated_at = Some(now.clone());

        let status = if success {
            NodeStatus::Completed
        } else {
            NodeStatus::Failed
        };
        let summary = if summary.is_empty() {
            if success {
                "completed"
            } else {
                "failed"
            }
        } else {
            summary
        };

        // A completion without a prior start still gets recorded.
        if let Some(node) = self.record.node_mut(name) {
            node.status = status;
            node.completed_at = Some(now.clone());
            node.summary = Some(summary.to_string());
        } else {
            self.record.nodes.push(NodeState {
                name: name.to_string(),
                status,
                started_at: None,
                completed_at: Some(now.clone()),
                summary: Some(summary.to_string()),
            });
        }

        if success {
            self.record.completed_nodes += 1;
        }

        self.record.push_log(
            name,
            LogEvent::Complete,
            time_of_day(&now),
            format!(
                "node '{name}' {}",
                if success { "completed" } else { "failed" }
            ),
        );

        if self.record.current_node.as_deref() == Some(name) {
            self.record.current_node = None;
        }
        self.persist()
    }

    pub fn complete_workflow(&mut self, success: bool) -> Result<()> {
        let now = utc_now();
        self.record.status = if success {
            WorkflowStatus::Completed
        } else {
            WorkflowStatus::Failed
        };
        self.record.updated_at = Some(now.clone());
        self.record.completed_at = Some(now.clone());
        self.record.current_node = None;
        self.record.push_log(
            WORKFLOW_NODE,
            LogEvent::Complete,
            time_of_day(&now),
            if success {
                "workflow completed"
            } else {
                "workflow failed"
            },
        );
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.record)
    }
}
