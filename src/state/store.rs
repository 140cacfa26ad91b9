use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::record::{LogEntry, NodeState, StateRecord, WorkflowStatus, WORKFLOW_NODE};
use super::time_of_day;

/// Scalar front-matter block of the persisted state document. Step detail
/// and log history live only in the generated body and are intentionally
/// not reloaded; each process session restarts them empty.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FrontMatter {
    workflow: String,
    status: WorkflowStatus,
    started_at: Option<String>,
    updated_at: Option<String>,
    completed_at: Option<String>,
    current_node: Option<String>,
    total_nodes: u64,
    completed_nodes: u64,
}

impl FrontMatter {
    fn of(record: &StateRecord) -> Self {
        FrontMatter {
            workflow: record.workflow.clone(),
            status: record.status,
            started_at: record.started_at.clone(),
            updated_at: record.updated_at.clone(),
            completed_at: record.completed_at.clone(),
            current_node: record.current_node.clone(),
            total_nodes: record.total_nodes,
            completed_nodes: record.completed_nodes,
        }
    }

    fn into_record(self) -> StateRecord {
        StateRecord {
            workflow: self.workflow,
            status: self.status,
            started_at: self.started_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            current_node: self.current_node,
            total_nodes: self.total_nodes,
            completed_nodes: self.completed_nodes,
            nodes: Vec::new(),
            logs: Vec::new(),
        }
    }
}

/// Crash-safe load/persist of a state record at a single on-disk path.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        StateStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unparseable file yields a fresh empty record; loading
    /// never raises.
    pub fn load(&self) -> StateRecord {
        let Ok(text) = fs::read_to_string(&self.path) else {
            return StateRecord::default();
        };
        parse_document(&text).unwrap_or_default()
    }

    /// Write to a sibling temp file, then atomically rename over the
    /// destination. The temp file is cleaned up on any failure.
    pub fn save(&self, record: &StateRecord) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create state directory {}", parent.display()))?;

        let content = render(record)?;
        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("unable to create temp file in {}", parent.display()))?;
        tmp.write_all(content.as_bytes())
            .context("unable to write state content")?;
        tmp.persist(&self.path)
            .map_err(|err| anyhow!("unable to replace {}: {}", self.path.display(), err.error))?;
        Ok(())
    }
}

fn parse_document(text: &str) -> Option<StateRecord> {
    let rest = text.strip_prefix("---")?;
    let end = rest.find("---")?;
    let front: FrontMatter = serde_yaml::from_str(&rest[..end]).ok()?;
    Some(front.into_record())
}

/// Full document: front-matter scalars plus a generated narrative body.
/// Regenerated wholesale on every save.
fn render(record: &StateRecord) -> Result<String> {
    let front = serde_yaml::to_string(&FrontMatter::of(record))?;

    let mut body = String::new();
    writeln!(body, "# Workflow Execution State")?;
    writeln!(body)?;
    writeln!(body, "## Overview")?;
    writeln!(body)?;
    let workflow = if record.workflow.is_empty() {
        "unknown"
    } else {
        record.workflow.as_str()
    };
    writeln!(body, "- **Workflow**: {workflow}")?;
    writeln!(body, "- **Status**: {}", record.status.label())?;
    writeln!(
        body,
        "- **Progress**: {}/{} nodes completed",
        record.completed_nodes, record.total_nodes
    )?;
    writeln!(
        body,
        "- **Current node**: {}",
        record.current_node.as_deref().unwrap_or("-")
    )?;
    writeln!(body)?;

    render_node_table(&mut body, &record.nodes)?;
    render_logs(&mut body, &record.logs)?;

    Ok(format!("---\n{front}---\n\n{body}"))
}

fn render_node_table(body: &mut String, nodes: &[NodeState]) -> Result<()> {
    writeln!(body, "## Node Status")?;
    writeln!(body)?;
    writeln!(body, "| Node | Status | Started | Completed | Summary |")?;
    writeln!(body, "|------|--------|---------|-----------|---------|")?;
    if nodes.is_empty() {
        writeln!(body, "| - | - | - | - | no nodes recorded |")?;
    }
    for node in nodes {
        writeln!(
            body,
            "| {} | {} | {} | {} | {} |",
            node.name,
            node.status.label(),
            node.started_at.as_deref().map(time_of_day).unwrap_or("-"),
            node.completed_at.as_deref().map(time_of_day).unwrap_or("-"),
            node.summary.as_deref().unwrap_or("-"),
        )?;
    }
    writeln!(body)?;
    Ok(())
}

/// Log entries grouped by node in append order: a new group header every
/// time the node changes between consecutive entries.
fn render_logs(body: &mut String, logs: &[LogEntry]) -> Result<()> {
    writeln!(body, "## Execution Log")?;
    writeln!(body)?;
    if logs.is_empty() {
        writeln!(body, "No log entries yet.")?;
        return Ok(());
    }

    let mut group: Option<&str> = None;
    for entry in logs {
        if group != Some(entry.node.as_str()) {
            group = Some(entry.node.as_str());
            if entry.node == WORKFLOW_NODE {
                writeln!(body, "### Workflow events")?;
            } else {
                writeln!(body, "### {}", entry.node)?;
            }
            writeln!(body)?;
        }
        writeln!(body, "- **{}**: {}", entry.timestamp, entry.message)?;
    }
    writeln!(body)?;
    Ok(())
}
