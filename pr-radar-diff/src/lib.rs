//! Diff model + unified diff parser (C1).
//!
//! Parses a unified diff into a `GitDiff` whose hunks preserve file and
//! intra-file order, and offers a hunk-local line-number projection helper.

pub mod errors;
pub mod model;
mod parser;
mod projection;

pub use errors::{DiffError, DiffResult};
pub use model::{DiffLine, DiffLineKind, GitDiff, Hunk};
pub use parser::parse_git_diff;
pub use projection::project_new_line;

#[cfg(test)]
mod tests {
    use super::*;

    const RENAME_ONLY: &str = "diff --git a/foo.h b/bar.h\nsimilarity index 100%\nrename from foo.h\nrename to bar.h\n";

    const SIMPLE: &str = "diff --git a/foo.py b/foo.py\nindex ab12..cd34 100644\n--- a/foo.py\n+++ b/foo.py\n@@ -1,3 +1,4 @@\n def f():\n-    return 1\n+    return 2\n+    # note\n";

    const NEW_FILE: &str = "diff --git a/new.py b/new.py\nnew file mode 100644\nindex 0000000..ab12cd3\n--- /dev/null\n+++ b/new.py\n@@ -0,0 +1,2 @@\n+def f():\n+    return 1\n";

    #[test]
    fn parses_pure_rename() {
        let diff = parse_git_diff(RENAME_ONLY, "deadbeef").unwrap();
        assert_eq!(diff.hunks.len(), 1);
        let h = &diff.hunks[0];
        assert_eq!(h.file_path, "bar.h");
        assert_eq!(h.rename_from.as_deref(), Some("foo.h"));
        assert!(h.diff_lines.is_empty());
    }

    #[test]
    fn parses_simple_hunk() {
        let diff = parse_git_diff(SIMPLE, "deadbeef").unwrap();
        assert_eq!(diff.hunks.len(), 1);
        let h = &diff.hunks[0];
        assert_eq!(h.file_path, "foo.py");
        assert_eq!(h.old_start, 1);
        assert_eq!(h.new_start, 1);
        assert_eq!(h.diff_lines.len(), 4);
        assert_eq!(diff.changed_files(), vec!["foo.py".to_string()]);
    }

    #[test]
    fn new_file_keeps_explicit_zero_old_length() {
        let diff = parse_git_diff(NEW_FILE, "deadbeef").unwrap();
        assert_eq!(diff.hunks.len(), 1);
        let h = &diff.hunks[0];
        assert_eq!(h.old_start, 0);
        assert_eq!(h.old_length, 0);
        assert_eq!(h.new_length, 2);
        assert!(h.old_side_range().is_none());
        assert_eq!(
            h.diff_lines.iter().filter(|l| l.old_line_number.is_some()).count(),
            0
        );
    }

    #[test]
    fn round_trip_semantics_stable() {
        let a = parse_git_diff(SIMPLE, "deadbeef").unwrap();
        let b = parse_git_diff(SIMPLE, "deadbeef").unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
