//! Streaming conversion API: emit item results as they complete.
//!
//! ## Why stream?
//!
//! A batch of heavyweight LaTeX fragments can run for a while. A stream-based
//! API lets callers show per-item progress immediately instead of staring at
//! nothing until [`crate::convert::convert_batch`] returns — the CLI's
//! progress view is built on this.
//!
//! Results are emitted in **completion order**, which under `concurrency > 1`
//! is not input order. Sort by [`ItemResult::index`] if order matters (or use
//! [`crate::output::BatchOutput::from_results`], which does).

use crate::config::BatchConfig;
use crate::convert::process_item;
use crate::error::BatchError;
use crate::loader;
use crate::output::ItemResult;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of item results.
pub type ItemStream = Pin<Box<dyn Stream<Item = ItemResult> + Send>>;

/// Convert the batch, streaming results as each item finishes.
///
/// Loading happens up front, so all fatal errors surface here before the
/// stream exists; the stream itself never errors — per-item failures arrive
/// as `ItemResult`s carrying an [`crate::error::ItemError`].
///
/// # Returns
/// `Ok((total_items, stream))` — the item count is reported eagerly so
/// callers can size a progress display before the first result lands.
pub async fn convert_batch_stream(
    input: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<(usize, ItemStream), BatchError> {
    let input = input.as_ref();
    info!("starting streaming batch: '{}'", input.display());

    let items = loader::load_items(input)?;
    let total = items.len();
    let concurrency = config.concurrency;
    let config = config.clone();

    let s = stream::iter(items.into_iter().map(move |item| {
        let config = config.clone();
        async move { process_item(&item, &config).await }
    }))
    .buffer_unordered(concurrency);

    Ok((total, Box::pin(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn stream_reports_total_and_yields_every_item() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("batch.json");
        // empty fragments: the driver fails them before any external tool runs
        tokio::fs::write(&input, r#"{"equations":["","",""]}"#)
            .await
            .unwrap();
        let config = BatchConfig::builder()
            .output_dir(dir.path().join("out"))
            .concurrency(2)
            .build()
            .unwrap();

        let (total, mut stream) = convert_batch_stream(&input, &config).await.unwrap();
        assert_eq!(total, 3);

        let mut results = Vec::new();
        while let Some(result) = stream.next().await {
            results.push(result);
        }
        assert_eq!(results.len(), 3);

        results.sort_by_key(|r| r.index);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["equation_0", "equation_1", "equation_2"]);
    }

    #[tokio::test]
    async fn fatal_errors_surface_before_the_stream_exists() {
        let config = BatchConfig::default();
        let err = convert_batch_stream("/no/such/batch.json", &config)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::FileNotFound { .. }));
    }
}
