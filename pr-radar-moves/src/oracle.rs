//! The re-diff oracle: an external collaborator we specify only the
//! interface of (§6). `LocalProcessRediffOracle` is a default,
//! process-based implementation good enough to run the pipeline end to end
//! without a network dependency.

use crate::errors::{MoveError, MoveResult};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// `(old_text, new_text, old_label, new_label) -> unified_diff_text`.
///
/// Implemented as a native `async fn` in trait (no `async-trait`, no `dyn`)
/// per the teacher's enum-dispatch / zero-boxed-futures discipline.
pub trait RediffOracle {
    async fn rediff(
        &self,
        old_text: &str,
        new_text: &str,
        old_label: &str,
        new_label: &str,
    ) -> MoveResult<String>;
}

/// Shells out to the system `diff -u` binary. Appropriate per §1: the
/// re-diff step is an external collaborator whose interface we specify,
/// not a network call.
#[derive(Debug, Clone, Default)]
pub struct LocalProcessRediffOracle;

impl RediffOracle for LocalProcessRediffOracle {
    async fn rediff(
        &self,
        old_text: &str,
        new_text: &str,
        old_label: &str,
        new_label: &str,
    ) -> MoveResult<String> {
        let old_file = write_tmp(old_text).await?;
        let new_file = write_tmp(new_text).await?;

        debug!(old_label, new_label, "invoking diff -u");

        let output = Command::new("diff")
            .arg("-u")
            .arg("--label")
            .arg(old_label)
            .arg("--label")
            .arg(new_label)
            .arg(old_file.path())
            .arg(new_file.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| MoveError::RediffFailed {
                source_label: old_label.to_string(),
                target_label: new_label.to_string(),
                reason: format!("failed to spawn diff: {e}"),
            })?;

        // `diff` exits 1 when inputs differ (the expected case) and 2 on
        // a real error; only treat 2+ as failure.
        if let Some(code) = output.status.code() {
            if code >= 2 {
                return Err(MoveError::RediffFailed {
                    source_label: old_label.to_string(),
                    target_label: new_label.to_string(),
                    reason: String::from_utf8_lossy(&output.stderr).into_owned(),
                });
            }
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Creates a securely-named temp file (`tempfile::NamedTempFile`, `O_EXCL`
/// under the hood) and fills it with `contents`; the file is removed when
/// the returned handle is dropped.
async fn write_tmp(contents: &str) -> MoveResult<NamedTempFile> {
    let file = NamedTempFile::new().map_err(|e| MoveError::RediffFailed {
        source_label: String::new(),
        target_label: String::new(),
        reason: format!("failed to create temp file: {e}"),
    })?;
    let mut handle = tokio::fs::File::create(file.path())
        .await
        .map_err(|e| MoveError::RediffFailed {
            source_label: String::new(),
            target_label: String::new(),
            reason: format!("failed to open temp file: {e}"),
        })?;
    handle
        .write_all(contents.as_bytes())
        .await
        .map_err(|e| MoveError::RediffFailed {
            source_label: String::new(),
            target_label: String::new(),
            reason: format!("failed to write temp file: {e}"),
        })?;
    Ok(file)
}
