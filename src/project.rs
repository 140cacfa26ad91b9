use std::env;
use std::path::{Path, PathBuf};

pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

fn env_project_dir() -> Option<PathBuf> {
    env::var(PROJECT_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Locate the contracts directory: an existing `.claude/contracts` under the
/// project dir from the environment, then under the current directory, then
/// the default path even if it does not exist.
pub fn contracts_dir(override_root: Option<&Path>) -> PathBuf {
    if let Some(root) = override_root {
        return root.join(".claude").join("contracts");
    }

    let env_root = env_project_dir();
    if let Some(root) = &env_root {
        let dir = root.join(".claude").join("contracts");
        if dir.is_dir() {
            return dir;
        }
    }

    let cwd = current_dir();
    let local = cwd.join(".claude").join("contracts");
    if local.is_dir() {
        return local;
    }

    env_root.unwrap_or(cwd).join(".claude").join("contracts")
}

/// State file lives at a fixed relative path under the workflow root.
pub fn state_file(override_root: Option<&Path>) -> PathBuf {
    let root = match override_root {
        Some(root) => root.to_path_buf(),
        None => env_project_dir().unwrap_or_else(current_dir),
    };
    root.join(".context").join("state.md")
}
