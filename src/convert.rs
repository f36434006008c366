//! Eager (full-batch) conversion entry points.
//!
//! This module provides the simpler API: process every item, then return one
//! [`BatchOutput`] with per-item results and aggregate stats. Use
//! [`crate::stream::convert_batch_stream`] instead when results should be
//! displayed progressively (the CLI's progress view does).
//!
//! ## Failure isolation
//!
//! Only loading can fail the whole run — and only before any rendering has
//! started. Once items exist, every failure is captured inside that item's
//! [`ItemResult`] and the batch continues; callers read
//! `output.stats.failed` to decide how loudly to complain.

use crate::config::BatchConfig;
use crate::document;
use crate::error::{BatchError, ItemError};
use crate::loader::{self, Item};
use crate::output::{BatchOutput, ItemResult};
use crate::pipeline::{place, rasterize, typeset};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert every item in the batch file to an image.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`  — Path to the batch JSON file
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(BatchOutput)` on any outcome where loading succeeded, even if some
/// (or all) items failed — check `output.stats.failed`.
///
/// # Errors
/// Returns `Err(BatchError)` only for fatal errors raised before any item is
/// processed: missing/unreadable file, malformed JSON or schema, duplicate
/// ids, empty batch. In particular the output directory is not touched on a
/// fatal error.
pub async fn convert_batch(
    input: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<BatchOutput, BatchError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("starting batch: '{}'", input.display());

    let items = loader::load_items(input)?;
    info!(
        "{} items → {} at scale {} into '{}'",
        items.len(),
        config.format,
        config.scale,
        config.output_dir.display()
    );

    let results: Vec<ItemResult> = stream::iter(items.iter().map(|item| process_item(item, config)))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    let output = BatchOutput::from_results(results, total_start.elapsed().as_millis() as u64);
    info!(
        "batch complete: {}/{} items succeeded in {}ms",
        output.stats.succeeded, output.stats.total_items, output.stats.total_duration_ms
    );
    Ok(output)
}

/// Synchronous wrapper around [`convert_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_batch_sync(
    input: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<BatchOutput, BatchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BatchError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert_batch(input, config))
}

/// Run one item through builder → renderer → placer, capturing any failure.
///
/// Never returns an error: the outcome, good or bad, lands in the
/// [`ItemResult`] so the batch driver can keep going.
pub(crate) async fn process_item(item: &Item, config: &BatchConfig) -> ItemResult {
    let start = Instant::now();

    let outcome = if item.latex.trim().is_empty() {
        Err(ItemError::EmptySource {
            id: item.id.clone(),
        })
    } else {
        run_pipeline(item, config).await
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(output_path) => {
            info!("item '{}' done in {}ms", item.id, duration_ms);
            ItemResult {
                index: item.index,
                id: item.id.clone(),
                kind: item.kind,
                output_path: Some(output_path),
                error: None,
                duration_ms,
            }
        }
        Err(error) => {
            warn!("item '{}' failed ({}): {}", item.id, error.kind(), error);
            ItemResult {
                index: item.index,
                id: item.id.clone(),
                kind: item.kind,
                output_path: None,
                error: Some(error),
                duration_ms,
            }
        }
    }
}

/// The per-item pipeline proper: scratch workspace, typeset, convert, place.
async fn run_pipeline(item: &Item, config: &BatchConfig) -> Result<std::path::PathBuf, ItemError> {
    let workspace = tempfile::tempdir().map_err(|e| ItemError::Write {
        id: item.id.clone(),
        detail: format!("failed to create scratch workspace: {e}"),
    })?;

    let result = async {
        let source = document::build_document(item);
        typeset::typeset(&source, &item.id, workspace.path(), config).await?;
        let artifact = rasterize::to_image(&item.id, workspace.path(), config).await?;
        let filename = format!("{}.{}", item.id, config.format.extension());
        place::place(&artifact, &config.output_dir, &filename, &item.id).await
    }
    .await;

    if config.keep_temp {
        let kept = workspace.keep();
        info!("item '{}': scratch workspace kept at '{}'", item.id, kept.display());
    }
    // otherwise the TempDir drops here, on success and failure alike

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ItemKind;

    fn config_in(dir: &Path) -> BatchConfig {
        BatchConfig::builder()
            .output_dir(dir.join("out"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn empty_source_fails_without_touching_the_toolchain() {
        let dir = tempfile::tempdir().unwrap();
        let item = Item {
            index: 0,
            id: "equation_0".into(),
            latex: "   ".into(),
            auto_align: true,
            kind: ItemKind::Equation,
        };

        let result = process_item(&item, &config_in(dir.path())).await;

        assert!(!result.is_success());
        assert_eq!(result.error.as_ref().unwrap().kind(), "empty-source");
        assert!(result.output_path.is_none());
        // nothing rendered, so nothing placed
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn missing_latex_engine_is_a_per_item_compilation_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::builder()
            .output_dir(dir.path().join("out"))
            .latex_command("tex2img-no-such-engine")
            .build()
            .unwrap();
        let item = Item {
            index: 0,
            id: "equation_0".into(),
            latex: "a+b".into(),
            auto_align: true,
            kind: ItemKind::Equation,
        };

        let result = process_item(&item, &config).await;

        assert!(!result.is_success());
        assert_eq!(result.error.as_ref().unwrap().kind(), "compilation");
    }

    #[tokio::test]
    async fn fatal_load_error_precedes_any_processing() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_batch(dir.path().join("absent.json"), &config_in(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::FileNotFound { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn batch_of_empty_items_reports_all_failures() {
        // Empty fragments fail before any external tool runs, so this
        // exercises the whole driver without a LaTeX installation.
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("batch.json");
        tokio::fs::write(
            &input,
            r#"{"equations":[{"latex":""},{"id":"bad","latex":"  "}]}"#,
        )
        .await
        .unwrap();

        let output = convert_batch(&input, &config_in(dir.path())).await.unwrap();

        assert_eq!(output.stats.total_items, 2);
        assert_eq!(output.stats.failed, 2);
        assert!(!output.is_success());
        let ids: Vec<&str> = output.failures().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["equation_0", "bad"]);
    }

    #[tokio::test]
    async fn duplicate_ids_abort_the_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("batch.json");
        tokio::fs::write(
            &input,
            r#"{"equations":[{"id":"a","latex":"x"},{"id":"a","latex":"y"}]}"#,
        )
        .await
        .unwrap();

        let err = convert_batch(&input, &config_in(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::DuplicateId { ref id } if id == "a"));
        assert!(!dir.path().join("out").exists());
    }
}
