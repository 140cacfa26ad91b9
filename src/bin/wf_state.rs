use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use wf_hooks_rs::envelope::{self, HookEvent, HookResponse};
use wf_hooks_rs::project;
use wf_hooks_rs::state::classify::classify;
use wf_hooks_rs::state::{RestartPolicy, WorkflowState};

#[derive(Parser, Debug)]
#[command(name = "wf-state")]
#[command(about = "Track workflow and step lifecycle in a durable state file")]
struct CliOptions {
    /// Project root override (defaults to $CLAUDE_PROJECT_DIR, then cwd)
    #[arg(long = "project-dir")]
    project_dir: Option<PathBuf>,

    /// State file override (defaults to <project>/.context/state.md)
    #[arg(long = "state-file")]
    state_file: Option<PathBuf>,
}

fn main() {
    let opts = CliOptions::parse();
    let response = run(&opts);
    if let Err(err) = response.emit() {
        eprintln!("wf-state: unable to emit response: {err}");
        std::process::exit(1);
    }
}

fn run(opts: &CliOptions) -> HookResponse {
    let event = match HookEvent::from_reader(io::stdin()) {
        Ok(event) => event,
        Err(err) => {
            return HookResponse::message(format!("wf-state: unable to parse input ({err})"))
        }
    };

    let path = opts
        .state_file
        .clone()
        .unwrap_or_else(|| project::state_file(opts.project_dir.as_deref()));
    let mut state = WorkflowState::open(path, RestartPolicy::from_env());

    // State tracking must never abort the host workflow; any failure turns
    // into an informational message.
    match apply_event(&mut state, &event) {
        Ok(Some(message)) => HookResponse::message(message),
        Ok(None) => HookResponse::allow(),
        Err(err) => HookResponse::message(format!("wf-state: state update failed ({err})")),
    }
}

fn apply_event(state: &mut WorkflowState, event: &HookEvent) -> Result<Option<String>> {
    match event.event.as_str() {
        "UserPromptSubmit" => {
            let Some(name) = envelope::workflow_command(&event.user_prompt) else {
                return Ok(None);
            };
            let name = name.to_string();
            state.start_workflow(&name, 0)?;
            Ok(Some(format!("wf-state: workflow '{name}' started")))
        }
        "PreToolUse" if event.is_task() => {
            let Some(node) = event.node.as_deref() else {
                return Ok(None);
            };
            state.start_node(node)?;
            Ok(Some(format!("wf-state: node '{node}' started")))
        }
        "PostToolUse" if event.is_task() => {
            let Some(node) = event.node.as_deref() else {
                return Ok(None);
            };
            let outcome = classify(&event.tool_result);
            state.complete_node(node, outcome.success, &outcome.summary)?;
            Ok(Some(format!(
                "wf-state: node '{node}' {}",
                if outcome.success { "completed" } else { "failed" }
            )))
        }
        "Stop" => {
            let success = !state.record().has_failed_node();
            state.complete_workflow(success)?;
            Ok(Some(format!(
                "wf-state: workflow {}",
                if success { "completed" } else { "failed" }
            )))
        }
        _ => Ok(None),
    }
}
