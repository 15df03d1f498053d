use std::env::current_exe;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Error, bail};

/// Hands a list of lines to fzf and returns the one the user picked.
///
/// When `preview` is set, fzf is told to call back into this binary's
/// `preview` subcommand with the highlighted line; fzf advertises the preview
/// pane's rows/columns to that process through its own environment variables.
///
/// A non-zero exit or empty choice means the user closed the selector, which
/// is reported as an error rather than an empty selection.
pub(crate) fn show_selection(items: &[String], preview: bool) -> Result<String, Error> {
    let mut command = Command::new("fzf");

    if preview {
        let exe = current_exe().context("could not locate own executable for the preview hook")?;
        command.arg(format!("--preview={} preview {{}}", exe.display()));
    }

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .context("failed to launch fzf (is it installed?)")?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(items.join("\n").as_bytes())
            .context("failed to hand the selection list to fzf")?;
    }

    let output = child
        .wait_with_output()
        .context("failed to wait for fzf")?;
    let selected = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if !output.status.success() || selected.is_empty() {
        bail!("selection cancelled");
    }

    Ok(selected)
}
