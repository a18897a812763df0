//! Move-detection data model: `TaggedLine`, `MoveCandidate`, `MoveDetail`,
//! `MoveReport`.

use pr_radar_diff::DiffLineKind;
use serde::{Deserialize, Serialize};

/// A `DiffLine` annotated with file, absolute line number, enclosing hunk
/// index, and a kind restricted to `{added, removed}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedLine {
    pub file_path: String,
    pub hunk_index: usize,
    /// Absolute line number: `old_line_number` for removed lines,
    /// `new_line_number` for added lines.
    pub line: u32,
    pub kind: DiffLineKind,
    pub content: String,
    /// Whitespace-trimmed content, used for move matching.
    pub normalized: String,
}

impl TaggedLine {
    pub fn new(
        file_path: impl Into<String>,
        hunk_index: usize,
        line: u32,
        kind: DiffLineKind,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let normalized = content.trim().to_string();
        Self {
            file_path: file_path.into(),
            hunk_index,
            line,
            kind,
            content,
            normalized,
        }
    }
}

/// A contiguous run of matched deleted/added lines representing code moved
/// between (or within) files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCandidate {
    pub source_file: String,
    pub target_file: String,
    pub removed_lines: Vec<TaggedLine>,
    pub added_lines: Vec<TaggedLine>,
    pub score: f64,
}

impl MoveCandidate {
    pub fn matched_lines(&self) -> usize {
        self.removed_lines.len()
    }

    pub fn source_span(&self) -> u32 {
        span(&self.removed_lines)
    }

    pub fn target_span(&self) -> u32 {
        span(&self.added_lines)
    }

    pub fn source_start(&self) -> u32 {
        self.removed_lines.first().map(|l| l.line).unwrap_or(0)
    }

    pub fn target_start(&self) -> u32 {
        self.added_lines.first().map(|l| l.line).unwrap_or(0)
    }
}

fn span(lines: &[TaggedLine]) -> u32 {
    match (lines.first(), lines.last()) {
        (Some(a), Some(b)) => b.line.saturating_sub(a.line) + 1,
        _ => 0,
    }
}

/// Serialization form of a consumed move candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveDetail {
    pub source_file: String,
    pub target_file: String,
    pub source_lines: (u32, u32),
    pub target_lines: (u32, u32),
    pub matched_lines: usize,
    pub score: f64,
    pub effective_diff_lines: usize,
}

/// Aggregate report of all moves detected and reduced in one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveReport {
    pub moves_detected: usize,
    pub total_lines_moved: usize,
    pub total_lines_effectively_changed: usize,
    pub moves: Vec<MoveDetail>,
}

impl MoveReport {
    pub fn from_details(moves: Vec<MoveDetail>) -> Self {
        let total_lines_moved = moves.iter().map(|m| m.matched_lines).sum();
        let total_lines_effectively_changed =
            moves.iter().map(|m| m.effective_diff_lines).sum();
        Self {
            moves_detected: moves.len(),
            total_lines_moved,
            total_lines_effectively_changed,
            moves,
        }
    }
}
