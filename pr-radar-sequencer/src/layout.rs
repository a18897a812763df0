//! Deterministic on-disk directory layout, grounded in
//! `mr-reviewer::cache`'s stable-key path derivation.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{SequencerError, SequencerResult};
use crate::phase::{Phase, PhaseResult};

/// Filesystem-safe replacement for a repo slug (slashes → underscores),
/// matching `mr-reviewer::cache::sanitize`.
pub fn sanitize_slug(s: &str) -> String {
    s.replace('/', "_")
}

/// `<output_root>/<repo_slug>/<pr_number>/`.
pub fn pr_dir(output_root: &Path, repo_slug: &str, pr_number: u64) -> PathBuf {
    output_root
        .join(sanitize_slug(repo_slug))
        .join(pr_number.to_string())
}

/// `<output_root>/<repo_slug>/<pr_number>/<phase-dir>/`.
pub fn phase_dir(output_root: &Path, repo_slug: &str, pr_number: u64, phase: Phase) -> PathBuf {
    pr_dir(output_root, repo_slug, pr_number).join(phase.dir_name())
}

pub fn phase_result_path(dir: &Path) -> PathBuf {
    dir.join("phase_result.json")
}

/// Serializes `value` with canonicalized (sorted) object keys: round-tripping
/// through `serde_json::Value` sorts every nested object, since `Value`'s map
/// type is a `BTreeMap` with the `preserve_order` feature off (not enabled in
/// this workspace) — `to_string_pretty`/`to_vec_pretty` alone preserve struct
/// declaration order, which does not satisfy §6's "keys sorted" on-disk
/// format rule.
fn to_sorted_pretty_json<T: serde::Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let canonical: serde_json::Value = serde_json::to_value(value)?;
    serde_json::to_vec_pretty(&canonical)
}

/// Writes `phase_result.json` via the required atomic-rename pattern: write
/// to `<name>.tmp`, fsync, rename (§5).
pub fn write_phase_result(dir: &Path, result: &PhaseResult) -> SequencerResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| SequencerError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let json = to_sorted_pretty_json(result).map_err(|source| SequencerError::Json {
        path: phase_result_path(dir),
        source,
    })?;

    let tmp_path = dir.join("phase_result.json.tmp");
    {
        let mut f = std::fs::File::create(&tmp_path).map_err(|source| SequencerError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        f.write_all(&json).map_err(|source| SequencerError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        f.sync_all().map_err(|source| SequencerError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }

    let final_path = phase_result_path(dir);
    std::fs::rename(&tmp_path, &final_path).map_err(|source| SequencerError::Io {
        path: final_path,
        source,
    })?;
    debug!(phase = ?result.phase, status = ?result.status, dir = %dir.display(), "phase_result.json written");
    Ok(())
}

/// Reads `phase_result.json` if present. Absence is not an error — it
/// signals "no marker yet", handled by the legacy heuristics in
/// `crate::status`.
pub fn read_phase_result(dir: &Path) -> SequencerResult<Option<PhaseResult>> {
    let path = phase_result_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path).map_err(|source| SequencerError::Io {
        path: path.clone(),
        source,
    })?;
    let result: PhaseResult =
        serde_json::from_slice(&bytes).map_err(|source| SequencerError::Json { path, source })?;
    Ok(Some(result))
}

/// Writes a UTF-8 text artifact, creating parent directories as needed.
pub fn write_text(path: &Path, contents: &str) -> SequencerResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SequencerError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| SequencerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes `value` as pretty JSON and writes it, per §6's "pretty
/// printed" on-disk format requirement.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> SequencerResult<()> {
    let json = to_sorted_pretty_json(value)
        .map_err(|source| SequencerError::Json { path: path.to_path_buf(), source })?;
    write_text(path, &String::from_utf8(json).expect("serde_json output is valid UTF-8"))
}

/// Reads and deserializes a JSON artifact.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> SequencerResult<T> {
    let bytes = std::fs::read(path).map_err(|source| SequencerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|source| SequencerError::Json { path: path.to_path_buf(), source })
}

/// Every `.json` file directly under `dir`, excluding sequencer-internal
/// bookkeeping files (`phase_result.json`, `summary.json` and its `.tmp`).
pub fn json_artifact_paths(dir: &Path, exclude: &[&str]) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            !exclude.contains(&name)
        })
        .collect();
    out.sort();
    out
}
