use std::{env, path::Path, process::ExitCode};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_EDITOR: &str = "vim";

/// `$VISUAL`, then `$EDITOR`, then [DEFAULT_EDITOR].
pub fn editor_from_env() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Runs `editor` on `path` and forwards its exit status. The editor command may carry its own
/// arguments, e.g. `code --wait`.
pub async fn edit_ledger(editor: &str, path: &Path) -> Result<ExitCode> {
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("Editor command is empty")?;

    debug!("Running {editor} on {path:?}");
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .await
        .with_context(|| format!("Failed to run editor {editor:?}"))?;

    if status.success() {
        return Ok(ExitCode::SUCCESS);
    }
    warn!("Editor exited with {status}");
    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}
