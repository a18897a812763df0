//! Move detection (C2) and effective-diff reduction (C3).

pub mod detect;
pub mod effective;
pub mod errors;
pub mod model;
pub mod oracle;

pub use detect::{detect_moves, MoveDetectConfig};
pub use effective::{build_effective_diff, EffectiveDiffConfig};
pub use errors::{MoveError, MoveResult};
pub use model::{MoveCandidate, MoveDetail, MoveReport, TaggedLine};
pub use oracle::{LocalProcessRediffOracle, RediffOracle};

#[cfg(test)]
mod tests {
    use super::*;
    use pr_radar_diff::parse_git_diff;
    use std::collections::HashMap;

    const REORDER_DIFF: &str = concat!(
        "diff --git a/foo.m b/foo.m\n",
        "--- a/foo.m\n",
        "+++ a/foo.m\n",
        "@@ -1,10 +1,6 @@\n",
        " l1\n",
        " l2\n",
        "-l3\n",
        "-l4\n",
        "-l5\n",
        "-l6\n",
        " l7\n",
        " l8\n",
        " l9\n",
        " l10\n",
        "diff --git a/bar.m b/bar.m\n",
        "--- a/bar.m\n",
        "+++ b/bar.m\n",
        "@@ -40,2 +40,6 @@\n",
        " before\n",
        "+ l3\n",
        "+ l4\n",
        "+ l5\n",
        "+ l6\n",
        " after\n",
    );

    /// S1: re-running move detection on the same diff twice produces the
    /// same candidate set (idempotence, §8 property 4).
    #[test]
    fn move_detection_is_idempotent() {
        let diff = parse_git_diff(REORDER_DIFF, "abc").unwrap();
        let first = detect_moves(&diff, MoveDetectConfig::default());
        let second = detect_moves(&diff, MoveDetectConfig::default());
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].source_file, second[0].source_file);
        assert_eq!(first[0].matched_lines(), second[0].matched_lines());
    }

    /// S2: moves conserve total lines — matched_lines never exceeds either
    /// side's span (§8 property 3).
    #[test]
    fn move_conserves_line_counts() {
        let diff = parse_git_diff(REORDER_DIFF, "abc").unwrap();
        let moves = detect_moves(&diff, MoveDetectConfig::default());
        for m in &moves {
            assert!(m.matched_lines() <= m.source_span() as usize);
            assert!(m.matched_lines() <= m.target_span() as usize);
        }
    }

    #[tokio::test]
    async fn no_moves_leaves_diff_unchanged() {
        let diff_text = concat!(
            "diff --git a/a.txt b/a.txt\n",
            "--- a/a.txt\n",
            "+++ a/a.txt\n",
            "@@ -1,1 +1,1 @@\n",
            "-old\n",
            "+new\n",
        );
        let diff = parse_git_diff(diff_text, "abc").unwrap();
        let candidates = detect_moves(&diff, MoveDetectConfig::default());
        assert!(candidates.is_empty());

        let (effective, report) = build_effective_diff(
            &diff,
            candidates,
            &HashMap::new(),
            &HashMap::new(),
            &LocalProcessRediffOracle,
            EffectiveDiffConfig::default(),
        )
        .await;

        assert_eq!(report.moves_detected, 0);
        assert_eq!(effective.hunks.len(), diff.hunks.len());
    }
}
