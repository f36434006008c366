//! Error types for the tex2img library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`] — **Fatal**: the batch cannot start at all (missing input
//!   file, malformed JSON, duplicate ids, invalid configuration). Returned as
//!   `Err(BatchError)` from the top-level `convert_batch*` functions before
//!   any item is processed.
//!
//! * [`ItemError`] — **Non-fatal**: a single item failed (LaTeX syntax error,
//!   conversion tool failure, write error) but all other items are fine.
//!   Stored inside [`crate::output::ItemResult`] so callers can inspect
//!   partial success rather than losing the whole batch to one bad fragment.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! item failure, log and continue, or collect all errors for a post-run
//! report. The CLI maps the two types to distinct exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tex2img library.
///
/// Item-level failures use [`ItemError`] and are stored in
/// [`crate::output::ItemResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Input file was not found at the given path.
    #[error("input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the input file.
    #[error("permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The input file is not valid JSON or does not match the expected shape.
    #[error("malformed input '{path}': {detail}")]
    MalformedInput { path: PathBuf, detail: String },

    /// Two items resolved to the same id.
    ///
    /// Ids must be unique because the output filename is `<id>.<format>`;
    /// a collision would make one item silently overwrite another.
    #[error("duplicate item id '{id}': ids must be unique within a batch")]
    DuplicateId { id: String },

    /// The input parsed but contained no items in either array.
    #[error("no equations or pseudocode found in '{path}'")]
    NoItems { path: PathBuf },

    /// Configuration validation failed (bad scale, zero concurrency, …).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single item.
///
/// Stored alongside [`crate::output::ItemResult`] when an item fails.
/// The batch continues with the remaining items. The tail of the diagnostic
/// output captured from the external tools rides along in the error; it is
/// the primary debugging aid for LaTeX syntax errors.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ItemError {
    /// The item's `latex` field was present but empty.
    #[error("item '{id}': empty LaTeX source")]
    EmptySource { id: String },

    /// The typesetting engine exited nonzero or produced no DVI.
    #[error("item '{id}': LaTeX compilation failed:\n{log}")]
    Compilation { id: String, log: String },

    /// The DVI-to-image conversion step failed.
    #[error("item '{id}': image conversion failed:\n{log}")]
    Conversion { id: String, log: String },

    /// Could not place the artifact in the output directory.
    #[error("item '{id}': failed to write output: {detail}")]
    Write { id: String, detail: String },

    /// An external tool exceeded its timeout.
    #[error("item '{id}': {stage} timed out after {secs}s")]
    Timeout {
        id: String,
        stage: String,
        secs: u64,
    },
}

impl ItemError {
    /// Short machine-friendly kind, used in the batch summary.
    pub fn kind(&self) -> &'static str {
        match self {
            ItemError::EmptySource { .. } => "empty-source",
            ItemError::Compilation { .. } => "compilation",
            ItemError::Conversion { .. } => "conversion",
            ItemError::Write { .. } => "write",
            ItemError::Timeout { .. } => "timeout",
        }
    }

    /// The id of the item this error belongs to.
    pub fn item_id(&self) -> &str {
        match self {
            ItemError::EmptySource { id }
            | ItemError::Compilation { id, .. }
            | ItemError::Conversion { id, .. }
            | ItemError::Write { id, .. }
            | ItemError::Timeout { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_display() {
        let e = BatchError::DuplicateId { id: "a".into() };
        assert!(e.to_string().contains("'a'"), "got: {e}");
    }

    #[test]
    fn compilation_error_preserves_log() {
        let e = ItemError::Compilation {
            id: "equation_0".into(),
            log: "! Undefined control sequence.\nl.12 \\frakc".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("equation_0"));
        assert!(msg.contains("Undefined control sequence"));
        assert_eq!(e.kind(), "compilation");
    }

    #[test]
    fn timeout_display_names_stage() {
        let e = ItemError::Timeout {
            id: "pseudocode_2".into(),
            stage: "latex".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("latex"));
        assert!(e.to_string().contains("30s"));
        assert_eq!(e.item_id(), "pseudocode_2");
    }

    #[test]
    fn item_error_round_trips_through_json() {
        let e = ItemError::Write {
            id: "equation_1".into(),
            detail: "disk full".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: ItemError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), "write");
        assert_eq!(back.item_id(), "equation_1");
    }
}
