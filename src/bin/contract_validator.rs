use std::io;
use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use wf_hooks_rs::contract::{CheckKind, ContractValidator, Outcome};
use wf_hooks_rs::envelope::{HookEvent, HookResponse};
use wf_hooks_rs::project;

#[derive(Parser, Debug)]
#[command(name = "contract-validator")]
#[command(about = "Validate workflow step input/output against declared contracts")]
struct CliOptions {
    /// Project root override (defaults to $CLAUDE_PROJECT_DIR, then cwd)
    #[arg(long = "project-dir")]
    project_dir: Option<PathBuf>,

    /// Contracts directory override (defaults to <project>/.claude/contracts)
    #[arg(long = "contracts-dir")]
    contracts_dir: Option<PathBuf>,
}

fn main() {
    let opts = CliOptions::parse();
    let response = run(&opts);
    if let Err(err) = response.emit() {
        eprintln!("contract-validator: unable to emit response: {err}");
        std::process::exit(1);
    }
}

fn run(opts: &CliOptions) -> HookResponse {
    let event = match HookEvent::from_reader(io::stdin()) {
        Ok(event) => event,
        Err(err) => {
            return HookResponse::message(format!(
                "contract-validator: unable to parse input ({err})"
            ))
        }
    };

    if !event.is_task() {
        return HookResponse::allow();
    }
    let Some(check) = CheckKind::from_event(&event.event) else {
        return HookResponse::allow();
    };
    let Some(node) = event.node.clone() else {
        return HookResponse::message("contract-validator: no step name found, skipping");
    };

    let contracts_dir = opts
        .contracts_dir
        .clone()
        .unwrap_or_else(|| project::contracts_dir(opts.project_dir.as_deref()));
    let validator = ContractValidator::new(contracts_dir);

    match validator.validate(check, &node, &event.prompt, &event.tool_result) {
        Outcome::Skipped(reason) => HookResponse::message(format!("contract-validator: {reason}")),
        Outcome::Pass => HookResponse::message(format!(
            "contract-validator: step '{node}' {check} check passed"
        )),
        Outcome::Fail {
            contract,
            errors,
            suggestion,
        } => {
            // Detailed diagnostic for the error channel; the envelope only
            // carries the short form.
            let diagnostic = json!({
                "status": "fail",
                "node": &node,
                "check_type": check.as_str(),
                "contract": &contract,
                "errors": &errors,
                "suggestion": &suggestion,
            });
            if let Ok(serialized) = serde_json::to_string(&diagnostic) {
                eprintln!("{serialized}");
            }

            let summary = errors
                .iter()
                .take(3)
                .map(|error| error.message.chars().take(100).collect::<String>())
                .collect::<Vec<_>>()
                .join("; ");
            let message = format!(
                "contract-validator: step '{node}' {check} check failed\n\
                 contract: {contract}\nerrors: {summary}\nsuggestion: {suggestion}"
            );
            if check.blocks_on_failure() {
                HookResponse::deny(message)
            } else {
                HookResponse::message(message)
            }
        }
    }
}
