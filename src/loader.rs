//! Input loading: parse the batch JSON file into normalized [`Item`]s.
//!
//! ## Input shape
//!
//! The file is a JSON object with at least one of the keys `equations` or
//! `pseudocode`, each an array. Array elements are either plain strings
//! (the LaTeX fragment, with all defaults) or objects:
//!
//! ```json
//! {
//!   "equations": [
//!     "E = mc^2",
//!     { "id": "euler", "latex": "e^{i\\pi} + 1 = 0", "auto_align": false }
//!   ],
//!   "pseudocode": [
//!     { "latex": "\\begin{algorithm}…\\end{algorithm}" }
//!   ]
//! }
//! ```
//!
//! Ordering is preserved from the input arrays: it determines the derived
//! default ids and the order of the final report, and is part of the
//! observable contract. Equations come before pseudocode in the batch.
//!
//! ## Id resolution
//!
//! An item without an explicit `id` gets `<kind>_<index>` where `<index>` is
//! its 0-based position within its own array (`equation_0`, `pseudocode_3`).
//! Resolution is a pure function of position and the provided id, so the same
//! input file yields the same ids on every run. Any collision among resolved
//! ids — explicit or derived — is a fatal [`BatchError::DuplicateId`]; ids
//! become output filenames, and a collision would silently drop an artifact.

use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Whether an item came from the `equations` or the `pseudocode` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Equation,
    Pseudocode,
}

impl ItemKind {
    /// The JSON key this kind of item lives under.
    pub fn key(&self) -> &'static str {
        match self {
            ItemKind::Equation => "equations",
            ItemKind::Pseudocode => "pseudocode",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Equation => f.write_str("equation"),
            ItemKind::Pseudocode => f.write_str("pseudocode"),
        }
    }
}

/// One normalized conversion unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// 0-based position in the overall batch (report order).
    pub index: usize,
    /// Resolved, batch-unique id; becomes the output filename stem.
    pub id: String,
    /// Raw LaTeX fragment. May be empty — validated per-item by the driver,
    /// not here, so one empty fragment cannot abort the whole batch.
    pub latex: String,
    /// Wrap equations in an alignment environment. Ignored for pseudocode.
    pub auto_align: bool,
    pub kind: ItemKind,
}

/// Top-level shape of the input file. Unknown keys are tolerated.
#[derive(Debug, Deserialize)]
struct RawBatch {
    #[serde(default)]
    equations: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pseudocode: Option<Vec<serde_json::Value>>,
}

/// Object form of an array element.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<String>,
    latex: String,
    #[serde(default)]
    auto_align: Option<bool>,
}

/// Load and normalize the batch file at `path`.
///
/// All schema problems are fatal [`BatchError`]s: nothing has been rendered
/// yet, so failing fast here is strictly better than discovering a malformed
/// element halfway through a long batch.
pub fn load_items(path: &Path) -> Result<Vec<Item>, BatchError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BatchError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => BatchError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => BatchError::Internal(format!("failed to read '{}': {e}", path.display())),
    })?;
    parse_items(&text, path)
}

/// Parse already-read JSON text into normalized items.
///
/// Split out from [`load_items`] so the schema rules are testable without
/// touching the filesystem.
pub fn parse_items(text: &str, path: &Path) -> Result<Vec<Item>, BatchError> {
    let raw: RawBatch = serde_json::from_str(text).map_err(|e| BatchError::MalformedInput {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if raw.equations.is_none() && raw.pseudocode.is_none() {
        return Err(BatchError::MalformedInput {
            path: path.to_path_buf(),
            detail: "expected at least one of 'equations' or 'pseudocode'".into(),
        });
    }

    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for (kind, elements) in [
        (ItemKind::Equation, raw.equations),
        (ItemKind::Pseudocode, raw.pseudocode),
    ] {
        for (idx, element) in elements.unwrap_or_default().into_iter().enumerate() {
            let (explicit_id, latex, auto_align) = normalize_element(element, kind, idx, path)?;
            let id = explicit_id.unwrap_or_else(|| default_id(kind, idx));
            if !seen.insert(id.clone()) {
                return Err(BatchError::DuplicateId { id });
            }
            items.push(Item {
                index: items.len(),
                id,
                latex,
                auto_align,
                kind,
            });
        }
    }

    if items.is_empty() {
        return Err(BatchError::NoItems {
            path: path.to_path_buf(),
        });
    }

    debug!("loaded {} items from '{}'", items.len(), path.display());
    Ok(items)
}

/// Normalize one array element to `(explicit_id, latex, auto_align)`.
fn normalize_element(
    element: serde_json::Value,
    kind: ItemKind,
    idx: usize,
    path: &Path,
) -> Result<(Option<String>, String, bool), BatchError> {
    match element {
        serde_json::Value::String(latex) => Ok((None, latex, true)),
        serde_json::Value::Object(_) => {
            let raw: RawItem =
                serde_json::from_value(element).map_err(|e| BatchError::MalformedInput {
                    path: path.to_path_buf(),
                    detail: format!("{}[{idx}]: {e}", kind.key()),
                })?;
            Ok((raw.id, raw.latex, raw.auto_align.unwrap_or(true)))
        }
        other => Err(BatchError::MalformedInput {
            path: path.to_path_buf(),
            detail: format!(
                "{}[{idx}]: expected a string or an object, got {}",
                kind.key(),
                json_type_name(&other)
            ),
        }),
    }
}

/// Derived id for an item without an explicit one.
fn default_id(kind: ItemKind, idx: usize) -> String {
    format!("{kind}_{idx}")
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
