//! Advisory run lock (§5 shared resources): concurrent runs against the
//! same `<pr_number>` directory are undefined and must be prevented by an
//! external lockfile. The sequencer checks for it and refuses to start if
//! held.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{SequencerError, SequencerResult};

const LOCK_FILE_NAME: &str = ".pr-radar.lock";

/// Held for the duration of one pipeline run against a PR directory.
/// Released (lockfile removed) on drop, including on early return via `?`.
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Attempts to exclusively create `<pr_dir>/.pr-radar.lock`. Fails with
    /// `SequencerError::Locked` if another run already holds it.
    pub fn acquire(pr_dir: &Path) -> SequencerResult<Self> {
        std::fs::create_dir_all(pr_dir).map_err(|source| SequencerError::Io {
            path: pr_dir.to_path_buf(),
            source,
        })?;
        let path = pr_dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                let _ = write!(f, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(source) if source.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(SequencerError::Locked { path })
            }
            Err(source) => Err(SequencerError::Io { path, source }),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_while_first_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock = RunLock::acquire(dir.path()).unwrap();
        let err = RunLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, SequencerError::Locked { .. }));
        drop(lock);
        assert!(RunLock::acquire(dir.path()).is_ok());
    }
}
