//! Hand the draft to the user's own editor

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::io::Write;
use std::process::Command;

const FALLBACK_EDITOR: &str = "vi";

/// The editor command from `$VISUAL`, then `$EDITOR`, then `vi`
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Edit `text` with the configured editor and return the saved result
pub fn edit_externally(text: &str) -> Result<String> {
    edit_with(&editor_command(), text)
}

/// Edit `text` with `editor`, a program optionally followed by arguments
pub fn edit_with(editor: &str, text: &str) -> Result<String> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow!("No editor configured"))?;

    let mut file = tempfile::Builder::new()
        .prefix("COMMIT_EDITMSG-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create a temporary file for the editor")?;
    file.write_all(text.as_bytes())?;
    file.flush()?;

    debug!("Launching editor `{editor}` on {}", file.path().display());

    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to launch `{editor}`"))?;

    if !status.success() {
        return Err(anyhow!("`{editor}` exited with {status}"));
    }

    let edited = std::fs::read_to_string(file.path())
        .context("Failed to read the edited message back")?;
    Ok(edited.trim_end_matches(['\n', '\r']).to_string())
}
