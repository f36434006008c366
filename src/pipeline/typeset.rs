//! Typesetting: compile a generated document to DVI with the LaTeX engine.
//!
//! The engine runs inside the item's private scratch workspace with
//! `-no-shell-escape` (the input is untrusted user data; shell escapes would
//! let a fragment run arbitrary commands) and `-interaction=nonstopmode` (a
//! syntax error must fail the run, not hang on an interactive prompt).
//!
//! A nonzero exit *or* a missing `.dvi` counts as a compilation failure —
//! nonstopmode lets latex limp past some errors with exit 0 but no output.

use crate::config::BatchConfig;
use crate::error::ItemError;
use crate::pipeline::{log_tail, run_tool, ToolRun, JOB_NAME};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How much of the latex log to carry in a [`ItemError::Compilation`].
/// The interesting part (`! …` error lines) is always at the end.
const LOG_TAIL_CHARS: usize = 4000;

/// Write `document` into the workspace and compile it to `item.dvi`.
///
/// Returns the path of the produced DVI file on success.
pub async fn typeset(
    document: &str,
    item_id: &str,
    workspace: &Path,
    config: &BatchConfig,
) -> Result<PathBuf, ItemError> {
    let tex_name = format!("{JOB_NAME}.tex");
    tokio::fs::write(workspace.join(&tex_name), document)
        .await
        .map_err(|e| ItemError::Compilation {
            id: item_id.to_string(),
            log: format!("failed to write {tex_name}: {e}"),
        })?;

    let args = vec![
        "-no-shell-escape".to_string(),
        "-interaction=nonstopmode".to_string(),
        tex_name,
    ];
    debug!("running {} for item '{}'", config.latex_command, item_id);
    let run = run_tool(
        &config.latex_command,
        &args,
        workspace,
        config.latex_timeout_secs,
    )
    .await
    .map_err(|e| ItemError::Compilation {
        id: item_id.to_string(),
        log: e,
    })?;

    let output = match run {
        ToolRun::TimedOut => {
            return Err(ItemError::Timeout {
                id: item_id.to_string(),
                stage: config.latex_command.clone(),
                secs: config.latex_timeout_secs,
            })
        }
        ToolRun::Completed(output) => output,
    };

    let dvi_path = workspace.join(format!("{JOB_NAME}.dvi"));
    if !output.ok || !dvi_path.exists() {
        return Err(ItemError::Compilation {
            id: item_id.to_string(),
            log: log_tail(&output.log, LOG_TAIL_CHARS),
        });
    }

    Ok(dvi_path)
}
