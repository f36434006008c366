//! Pipeline stages for LaTeX-to-image conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap a tool
//! invocation (e.g. a different rasteriser) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! item ──▶ typeset ──▶ rasterize ──▶ place
//! (.tex)   (latex→DVI) (dvisvgm,    (output dir)
//!                       rsvg-convert)
//! ```
//!
//! 1. [`typeset`]   — compile the generated document to DVI inside the item's
//!    private scratch workspace
//! 2. [`rasterize`] — DVI → SVG at the requested scale, then optionally
//!    SVG → PNG/JPG
//! 3. [`place`]     — move the artifact into the output directory under
//!    `<id>.<format>`
//!
//! All external tools run with the scratch workspace as their working
//! directory, so intermediate files never touch the caller's cwd and vanish
//! with the `TempDir` on every exit path.

pub mod place;
pub mod rasterize;
pub mod typeset;

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Fixed job name for scratch files: `item.tex` → `item.dvi` → `item.svg` → …
///
/// A fixed name is safe because every item owns its own workspace, and it
/// makes the tool output files predictable without parsing tool stdout.
pub(crate) const JOB_NAME: &str = "item";

/// Outcome of a completed (non-timed-out) tool invocation.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    /// Whether the tool exited with status zero.
    pub ok: bool,
    /// Interleaved stdout + stderr, lossily decoded.
    pub log: String,
}

/// Outcome of [`run_tool`].
#[derive(Debug)]
pub(crate) enum ToolRun {
    Completed(ToolOutput),
    TimedOut,
}

/// Run an external tool with a working directory and a timeout, capturing
/// its diagnostic output.
///
/// Returns `Err` only when the process could not be spawned at all (command
/// not installed); a nonzero exit is reported through [`ToolOutput::ok`] so
/// callers can attach the captured log to their error.
pub(crate) async fn run_tool(
    command: &str,
    args: &[String],
    cwd: &Path,
    timeout_secs: u64,
) -> Result<ToolRun, String> {
    let child = Command::new(command)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // If the timeout fires, the dropped future must take the process
        // with it rather than leave an orphaned latex chewing CPU.
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(Duration::from_secs(timeout_secs), child).await {
        Err(_) => Ok(ToolRun::TimedOut),
        Ok(Err(e)) => Err(format!("failed to run '{command}': {e}")),
        Ok(Ok(output)) => {
            let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                if !log.is_empty() && !log.ends_with('\n') {
                    log.push('\n');
                }
                log.push_str(&stderr);
            }
            Ok(ToolRun::Completed(ToolOutput {
                ok: output.status.success(),
                log,
            }))
        }
    }
}

/// Keep at most the last `max_chars` characters of a tool log.
///
/// LaTeX logs open with pages of package banners; the actual error is at the
/// end. The returned tail is always valid UTF-8 (split on a char boundary).
pub(crate) fn log_tail(log: &str, max_chars: usize) -> String {
    let trimmed = log.trim_end();
    let char_count = trimmed.chars().count();
    if char_count <= max_chars {
        return trimmed.to_string();
    }
    let skipped = char_count - max_chars;
    let tail: String = trimmed.chars().skip(skipped).collect();
    format!("[… {skipped} chars omitted …]\n{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_tail_passes_short_logs_through() {
        assert_eq!(log_tail("short log\n", 100), "short log");
    }

    #[test]
    fn log_tail_keeps_the_end() {
        let log = "a".repeat(50) + "! The actual error";
        let tail = log_tail(&log, 20);
        assert!(tail.ends_with("! The actual error"));
        assert!(tail.starts_with("[…"));
    }

    #[tokio::test]
    async fn run_tool_reports_missing_command_as_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_tool("definitely-not-a-real-tool-xyz", &[], dir.path(), 5)
            .await
            .unwrap_err();
        assert!(err.contains("definitely-not-a-real-tool-xyz"), "got: {err}");
    }

    #[tokio::test]
    async fn run_tool_captures_output_and_status() {
        let dir = tempfile::tempdir().unwrap();
        // `false` exists on any unix; exits 1 with no output
        let run = run_tool("false", &[], dir.path(), 5).await.unwrap();
        match run {
            ToolRun::Completed(out) => assert!(!out.ok),
            ToolRun::TimedOut => panic!("'false' should not time out"),
        }
    }

    #[tokio::test]
    async fn run_tool_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_tool("sleep", &["5".to_string()], dir.path(), 1)
            .await
            .unwrap();
        assert!(matches!(run, ToolRun::TimedOut));
    }
}
