//! Report persistence: JSON + markdown, in the teacher's
//! create-dir-then-write idiom (`review::mod::write_report`).

use std::path::Path;

use crate::errors::{ReportError, ReportResult};
use crate::markdown::render_markdown;
use crate::model::AnalysisSummary;

/// Serializes `value` with canonicalized (sorted) object keys: round-tripping
/// through `serde_json::Value` sorts every nested object, since `Value`'s map
/// type is a `BTreeMap` with the `preserve_order` feature off (not enabled in
/// this workspace) — `to_string_pretty` alone preserves struct declaration
/// order, which does not satisfy §6's "keys sorted" on-disk format rule.
fn to_sorted_pretty_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    let canonical: serde_json::Value = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&canonical)
}

/// Writes `<dir>/summary.json` and `<dir>/summary.md`, per §4.9's
/// phase-6-report directory layout.
pub fn write_report(dir: &Path, summary: &AnalysisSummary) -> ReportResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let json = to_sorted_pretty_json(summary)?;
    let json_path = dir.join("summary.json");
    std::fs::write(&json_path, json).map_err(|source| ReportError::Write {
        path: json_path,
        source,
    })?;

    let markdown = render_markdown(summary);
    let md_path = dir.join("summary.md");
    std::fs::write(&md_path, markdown).map_err(|source| ReportError::Write {
        path: md_path,
        source,
    })
}
