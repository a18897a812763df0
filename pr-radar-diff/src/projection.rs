//! Hunk-local line-number projection (§4.1).
//!
//! Maps a target-file line number to an index into `Hunk::diff_lines`.

use crate::errors::{DiffError, DiffResult};
use crate::model::{DiffLineKind, Hunk};

/// Finds the index into `hunk.diff_lines` whose `new_line_number == line`
/// and whose kind is `context` or `added`.
///
/// Returns `DiffError::ProjectionCollision` if more than one line shares the
/// same `new_line_number` (not possible under the parser's numbering rules,
/// but checked as an invariant per spec §4.1), and
/// `DiffError::LineNotCovered` if no such line exists in this hunk.
pub fn project_new_line(hunk: &Hunk, line: u32) -> DiffResult<usize> {
    let mut found: Option<usize> = None;
    for (idx, dl) in hunk.diff_lines.iter().enumerate() {
        if dl.new_line_number != Some(line) {
            continue;
        }
        if !matches!(dl.kind, DiffLineKind::Context | DiffLineKind::Added) {
            continue;
        }
        if found.is_some() {
            return Err(DiffError::ProjectionCollision {
                file: hunk.file_path.clone(),
                new_line: line,
            });
        }
        found = Some(idx);
    }
    found.ok_or_else(|| DiffError::LineNotCovered {
        file: hunk.file_path.clone(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiffLine;

    fn sample_hunk() -> Hunk {
        Hunk {
            file_path: "a.rs".into(),
            rename_from: None,
            old_start: 1,
            old_length: 3,
            new_start: 1,
            new_length: 3,
            diff_lines: vec![
                DiffLine::context(1, 1, "fn a() {".into()),
                DiffLine::removed(2, "old".into()),
                DiffLine::added(2, "new".into()),
                DiffLine::context(3, 3, "}".into()),
            ],
        }
    }

    #[test]
    fn projects_added_and_context_lines() {
        let h = sample_hunk();
        assert_eq!(project_new_line(&h, 1).unwrap(), 0);
        assert_eq!(project_new_line(&h, 2).unwrap(), 2);
        assert_eq!(project_new_line(&h, 3).unwrap(), 3);
    }

    #[test]
    fn fails_for_uncovered_line() {
        let h = sample_hunk();
        assert!(project_new_line(&h, 99).is_err());
    }
}
