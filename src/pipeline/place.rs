//! Placement: move the finished artifact into the output directory.
//!
//! The output directory (and any missing parents) is created on first use —
//! idempotent, so concurrent items racing on `create_dir_all` are harmless.
//! An existing file of the same name is overwritten: last-write-wins, no
//! versioning. Ids are unique within a batch, so overwrites only happen
//! across runs, which is the expected re-render behaviour.

use crate::error::ItemError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Place `artifact` into `output_dir` as `filename`, creating the directory
/// if needed. Returns the final path.
pub async fn place(
    artifact: &Path,
    output_dir: &Path,
    filename: &str,
    item_id: &str,
) -> Result<PathBuf, ItemError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ItemError::Write {
            id: item_id.to_string(),
            detail: format!("failed to create '{}': {e}", output_dir.display()),
        })?;

    let dest = output_dir.join(filename);
    // Copy rather than rename: the scratch workspace may live on a different
    // filesystem (tmpfs) than the output directory, where rename fails.
    tokio::fs::copy(artifact, &dest)
        .await
        .map_err(|e| ItemError::Write {
            id: item_id.to_string(),
            detail: format!("failed to write '{}': {e}", dest.display()),
        })?;

    debug!("placed '{}'", dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_output_directories() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("a.svg");
        tokio::fs::write(&artifact, "<svg/>").await.unwrap();

        let out_dir = dir.path().join("deep/nested/out");
        let dest = place(&artifact, &out_dir, "equation_0.svg", "equation_0")
            .await
            .unwrap();

        assert_eq!(dest, out_dir.join("equation_0.svg"));
        assert_eq!(tokio::fs::read_to_string(&dest).await.unwrap(), "<svg/>");
    }

    #[tokio::test]
    async fn overwrites_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("a.svg");
        tokio::fs::write(&artifact, "new").await.unwrap();

        let out_dir = dir.path().join("out");
        tokio::fs::create_dir_all(&out_dir).await.unwrap();
        tokio::fs::write(out_dir.join("x.svg"), "old").await.unwrap();

        place(&artifact, &out_dir, "x.svg", "x").await.unwrap();
        assert_eq!(
            tokio::fs::read_to_string(out_dir.join("x.svg")).await.unwrap(),
            "new"
        );
    }

    #[tokio::test]
    async fn missing_artifact_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = place(
            &dir.path().join("missing.svg"),
            &dir.path().join("out"),
            "x.svg",
            "x",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "write");
    }
}
