//! Move detector (C2).
//!
//! Discovers maximal matched pairs of contiguous removed/added line runs
//! representing the same code moved between (or within) files, per §4.2.

use pr_radar_diff::{DiffLineKind, GitDiff};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::model::{MoveCandidate, TaggedLine};

/// Tunables for move detection; defaults match §4.2/§9.
#[derive(Debug, Clone, Copy)]
pub struct MoveDetectConfig {
    /// Minimum number of matched lines for a run to survive (default 2).
    pub min_run_length: usize,
}

impl Default for MoveDetectConfig {
    fn default() -> Self {
        Self { min_run_length: 2 }
    }
}

/// Step 1: extract the `removed` and `added` tagged sequences from a
/// `GitDiff`, in hunk-index-then-line diff-tag order.
pub fn extract_tagged_sequences(diff: &GitDiff) -> (Vec<TaggedLine>, Vec<TaggedLine>) {
    let mut removed = Vec::new();
    let mut added = Vec::new();

    for (hunk_index, hunk) in diff.hunks.iter().enumerate() {
        for dl in &hunk.diff_lines {
            match dl.kind {
                DiffLineKind::Removed => {
                    let line = dl.old_line_number.expect("removed line has old_line_number");
                    removed.push(TaggedLine::new(
                        hunk.file_path.clone(),
                        hunk_index,
                        line,
                        DiffLineKind::Removed,
                        dl.content.clone(),
                    ));
                }
                DiffLineKind::Added => {
                    let line = dl.new_line_number.expect("added line has new_line_number");
                    added.push(TaggedLine::new(
                        hunk.file_path.clone(),
                        hunk_index,
                        line,
                        DiffLineKind::Added,
                        dl.content.clone(),
                    ));
                }
                DiffLineKind::Context => {}
            }
        }
    }

    (removed, added)
}

struct ExactMatch {
    removed_idx: usize,
    added_idx: usize,
}

/// Step 2: build an index from normalized content to unused `added`
/// positions, then greedily pair each `removed` line (in order) with the
/// first unmatched `added` entry sharing normalized content.
fn exact_line_matches(removed: &[TaggedLine], added: &[TaggedLine]) -> Vec<ExactMatch> {
    let mut by_content: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, line) in added.iter().enumerate() {
        if line.normalized.is_empty() {
            continue;
        }
        by_content.entry(line.normalized.as_str()).or_default().push(idx);
    }

    let mut consumed = vec![false; added.len()];
    let mut matches = Vec::new();

    for (removed_idx, rline) in removed.iter().enumerate() {
        if rline.normalized.is_empty() {
            continue;
        }
        let Some(candidates) = by_content.get(rline.normalized.as_str()) else {
            continue;
        };
        if let Some(&added_idx) = candidates.iter().find(|&&i| !consumed[i]) {
            consumed[added_idx] = true;
            matches.push(ExactMatch {
                removed_idx,
                added_idx,
            });
        }
    }

    matches
}

/// Index of the next line (strictly after `from`) with non-empty
/// normalized content, scanning the whole sequence regardless of file
/// boundary (a boundary crossing simply fails the contiguity check at the
/// run-grouping stage, per §4.2 step 3).
fn next_nonempty_after(lines: &[TaggedLine], from: usize) -> Option<usize> {
    lines[from + 1..]
        .iter()
        .position(|l| !l.normalized.is_empty())
        .map(|offset| from + 1 + offset)
}

struct RunBuilder {
    source_file: String,
    target_file: String,
    removed_indices: Vec<usize>,
    added_indices: Vec<usize>,
}

/// Step 3: group exact matches into contiguous run candidates.
fn group_into_runs(
    removed: &[TaggedLine],
    added: &[TaggedLine],
    matches: &[ExactMatch],
) -> Vec<RunBuilder> {
    let mut runs: Vec<RunBuilder> = Vec::new();

    for m in matches {
        let source_file = removed[m.removed_idx].file_path.clone();
        let target_file = added[m.added_idx].file_path.clone();

        let extends_last = runs.last().is_some_and(|run| {
            let same_files = run.source_file == source_file && run.target_file == target_file;
            let last_removed = *run.removed_indices.last().unwrap();
            let last_added = *run.added_indices.last().unwrap();
            let removed_contig = next_nonempty_after(removed, last_removed) == Some(m.removed_idx);
            let added_contig = next_nonempty_after(added, last_added) == Some(m.added_idx);
            same_files && removed_contig && added_contig
        });

        if extends_last {
            let run = runs.last_mut().unwrap();
            run.removed_indices.push(m.removed_idx);
            run.added_indices.push(m.added_idx);
        } else {
            runs.push(RunBuilder {
                source_file,
                target_file,
                removed_indices: vec![m.removed_idx],
                added_indices: vec![m.added_idx],
            });
        }
    }

    runs
}

fn span_of(lines: &[TaggedLine], indices: &[usize]) -> u32 {
    let first = indices.first().map(|&i| lines[i].line).unwrap_or(0);
    let last = indices.last().map(|&i| lines[i].line).unwrap_or(0);
    last.saturating_sub(first) + 1
}

/// Runs the full C2 algorithm and returns ordered, non-overlapping
/// `MoveCandidate`s, already resolved for overlap by the tie-break rule in
/// §4.2.
pub fn detect_moves(diff: &GitDiff, cfg: MoveDetectConfig) -> Vec<MoveCandidate> {
    let (removed, added) = extract_tagged_sequences(diff);
    let matches = exact_line_matches(&removed, &added);
    let runs = group_into_runs(&removed, &added, &matches);

    let mut candidates: Vec<MoveCandidate> = runs
        .into_iter()
        .filter(|r| r.removed_indices.len() >= cfg.min_run_length)
        .map(|r| {
            let matched = r.removed_indices.len();
            let source_span = span_of(&removed, &r.removed_indices).max(1);
            let target_span = span_of(&added, &r.added_indices).max(1);
            let score = matched as f64 / source_span.max(target_span) as f64;
            MoveCandidate {
                source_file: r.source_file,
                target_file: r.target_file,
                removed_lines: r.removed_indices.iter().map(|&i| removed[i].clone()).collect(),
                added_lines: r.added_indices.iter().map(|&i| added[i].clone()).collect(),
                score,
            }
        })
        .collect();

    // Tie-break order: desc matched_lines, desc score, asc source_start, asc target_start.
    candidates.sort_by(|a, b| {
        b.matched_lines()
            .cmp(&a.matched_lines())
            .then(b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.source_start().cmp(&b.source_start()))
            .then(a.target_start().cmp(&b.target_start()))
    });

    // Greedy sweep: accept a candidate only if none of its positions were
    // already consumed by a higher-preference candidate.
    let mut used_removed: HashSet<(String, u32)> = HashSet::new();
    let mut used_added: HashSet<(String, u32)> = HashSet::new();
    let mut accepted = Vec::new();

    for cand in candidates {
        let removed_positions: Vec<(String, u32)> = cand
            .removed_lines
            .iter()
            .map(|l| (l.file_path.clone(), l.line))
            .collect();
        let added_positions: Vec<(String, u32)> = cand
            .added_lines
            .iter()
            .map(|l| (l.file_path.clone(), l.line))
            .collect();

        let overlaps = removed_positions.iter().any(|p| used_removed.contains(p))
            || added_positions.iter().any(|p| used_added.contains(p));

        if overlaps {
            debug!(
                source = %cand.source_file,
                target = %cand.target_file,
                "dropping overlapping move candidate"
            );
            continue;
        }

        used_removed.extend(removed_positions);
        used_added.extend(added_positions);
        accepted.push(cand);
    }

    // Restore deterministic output order: by source_file then source_start.
    accepted.sort_by(|a, b| {
        a.source_file
            .cmp(&b.source_file)
            .then(a.source_start().cmp(&b.source_start()))
    });

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_radar_diff::parse_git_diff;

    const MOVE_DIFF: &str = concat!(
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

    #[test]
    fn detects_single_move_across_files() {
        let diff = parse_git_diff(MOVE_DIFF, "abc").unwrap();
        let moves = detect_moves(&diff, MoveDetectConfig::default());
        assert_eq!(moves.len(), 1);
        let m = &moves[0];
        assert_eq!(m.source_file, "foo.m");
        assert_eq!(m.target_file, "bar.m");
        assert_eq!(m.matched_lines(), 4);
    }

    #[test]
    fn below_minimum_run_length_is_dropped() {
        let tiny = concat!(
            "diff --git a/a.txt b/a.txt\n",
            "--- a/a.txt\n",
            "+++ a/a.txt\n",
            "@@ -1,2 +1,1 @@\n",
            "-only\n",
            " keep\n",
            "diff --git a/b.txt b/b.txt\n",
            "--- a/b.txt\n",
            "+++ b/b.txt\n",
            "@@ -1,1 +1,2 @@\n",
            " keep\n",
            "+only\n",
        );
        let diff = parse_git_diff(tiny, "abc").unwrap();
        let moves = detect_moves(&diff, MoveDetectConfig::default());
        assert!(moves.is_empty());
    }
}
