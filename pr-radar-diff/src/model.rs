//! Diff data model: `DiffLine`, `Hunk`, `GitDiff`.
//!
//! Mirrors the shape of `mr-reviewer::git_providers::types::{DiffLine,
//! DiffHunk}`, generalized with the `kind`/`content`/line-number fields the
//! spec's `DiffLine` entity calls for and a `file_path`-bearing `Hunk`.

use serde::{Deserialize, Serialize};

/// The three line kinds a unified diff body line can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    Context,
    Added,
    Removed,
}

/// One source line of a hunk.
///
/// `content` is verbatim, without the leading `+`/`-`/` ` prefix.
/// `old_line_number` is absent for additions, `new_line_number` is absent
/// for deletions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_line_number: Option<u32>,
}

impl DiffLine {
    pub fn context(old_line: u32, new_line: u32, content: String) -> Self {
        Self {
            kind: DiffLineKind::Context,
            content,
            old_line_number: Some(old_line),
            new_line_number: Some(new_line),
        }
    }

    pub fn added(new_line: u32, content: String) -> Self {
        Self {
            kind: DiffLineKind::Added,
            content,
            old_line_number: None,
            new_line_number: Some(new_line),
        }
    }

    pub fn removed(old_line: u32, content: String) -> Self {
        Self {
            kind: DiffLineKind::Removed,
            content,
            old_line_number: Some(old_line),
            new_line_number: None,
        }
    }

    /// Display prefix (`+`, `-`, or ` `) used when rendering the line back
    /// to unified-diff text.
    pub fn prefix(&self) -> char {
        match self.kind {
            DiffLineKind::Context => ' ',
            DiffLineKind::Added => '+',
            DiffLineKind::Removed => '-',
        }
    }
}

/// A contiguous change region inside a file version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hunk {
    /// New-side path (post-change). For pure deletions this is the last
    /// known path (old_path), since there is no new side.
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_from: Option<String>,
    pub old_start: u32,
    pub old_length: u32,
    pub new_start: u32,
    pub new_length: u32,
    pub diff_lines: Vec<DiffLine>,
}

impl Hunk {
    /// New-file line range covered by this hunk, inclusive. Empty hunks
    /// (renames/binaries) cover no lines.
    pub fn new_side_range(&self) -> Option<(u32, u32)> {
        if self.new_length == 0 {
            return None;
        }
        Some((self.new_start, self.new_start + self.new_length - 1))
    }

    pub fn old_side_range(&self) -> Option<(u32, u32)> {
        if self.old_length == 0 {
            return None;
        }
        Some((self.old_start, self.old_start + self.old_length - 1))
    }
}

/// Ordered sequence of hunks plus the commit this diff was computed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitDiff {
    pub commit_hash: String,
    pub hunks: Vec<Hunk>,
}

impl GitDiff {
    pub fn new(commit_hash: impl Into<String>, hunks: Vec<Hunk>) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            hunks,
        }
    }

    /// Preserved-order unique set of hunk file paths.
    pub fn changed_files(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for h in &self.hunks {
            if seen.insert(h.file_path.clone()) {
                out.push(h.file_path.clone());
            }
        }
        out
    }

    /// All hunks touching `file_path`, in order.
    pub fn hunks_for_file<'a>(&'a self, file_path: &str) -> impl Iterator<Item = &'a Hunk> {
        self.hunks.iter().filter(move |h| h.file_path == file_path)
    }
}
