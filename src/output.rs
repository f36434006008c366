//! Result types for a batch run: per-item outcomes and aggregate stats.
//!
//! Per-item failure isolation maps naturally onto a result-type-per-item:
//! every item produces an [`ItemResult`] whether it succeeded or not, and the
//! batch as a whole succeeds as long as loading did. Callers (and the CLI's
//! `--json` mode) inspect [`BatchStats`] to decide how to report partial
//! failure. Everything here is serde-serializable so a run's outcome can be
//! captured, diffed, and replayed in bug reports.

use crate::error::ItemError;
use crate::loader::ItemKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The outcome of one item, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    /// Position in the input batch; the report is sorted by this.
    pub index: usize,
    pub id: String,
    pub kind: ItemKind,
    /// Path of the placed artifact. `Some` iff `error` is `None`.
    pub output_path: Option<PathBuf>,
    pub error: Option<ItemError>,
    /// Wall-clock time spent on this item, external tools included.
    pub duration_ms: u64,
}

impl ItemResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// The full outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// One result per item, in input order.
    pub items: Vec<ItemResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Assemble the output from collected results, reinstating input order.
    pub fn from_results(mut items: Vec<ItemResult>, total_duration_ms: u64) -> Self {
        items.sort_by_key(|r| r.index);
        let succeeded = items.iter().filter(|r| r.is_success()).count();
        let stats = BatchStats {
            total_items: items.len(),
            succeeded,
            failed: items.len() - succeeded,
            total_duration_ms,
        };
        BatchOutput { items, stats }
    }

    /// True when every item produced an artifact.
    pub fn is_success(&self) -> bool {
        self.stats.failed == 0
    }

    /// The failed items, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|r| !r.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, id: &str, error: Option<ItemError>) -> ItemResult {
        ItemResult {
            index,
            id: id.into(),
            kind: ItemKind::Equation,
            output_path: error.is_none().then(|| PathBuf::from(format!("out/{id}.png"))),
            error,
            duration_ms: 10,
        }
    }

    #[test]
    fn from_results_reinstates_input_order() {
        // completion order 2, 0, 1 — as buffer_unordered may deliver
        let out = BatchOutput::from_results(
            vec![
                result(2, "equation_2", None),
                result(0, "equation_0", None),
                result(1, "equation_1", None),
            ],
            50,
        );
        let ids: Vec<&str> = out.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["equation_0", "equation_1", "equation_2"]);
    }

    #[test]
    fn stats_count_failures() {
        let out = BatchOutput::from_results(
            vec![
                result(0, "a", None),
                result(
                    1,
                    "b",
                    Some(ItemError::EmptySource { id: "b".into() }),
                ),
            ],
            100,
        );
        assert_eq!(out.stats.total_items, 2);
        assert_eq!(out.stats.succeeded, 1);
        assert_eq!(out.stats.failed, 1);
        assert!(!out.is_success());
        assert_eq!(out.failures().count(), 1);
    }

    #[test]
    fn output_serialises_to_json() {
        let out = BatchOutput::from_results(vec![result(0, "a", None)], 5);
        let json = serde_json::to_string_pretty(&out).unwrap();
        let back: BatchOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stats.total_items, 1);
        assert!(back.items[0].is_success());
    }
}
