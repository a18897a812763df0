//! Focus-area data model.

use serde::{Deserialize, Serialize};

/// Whether a `FocusArea` covers a whole hunk or a subdivided region inside
/// one, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusType {
    File,
    Method,
}

/// A reviewable unit of the diff: either a whole hunk (`file`) or a
/// subdivided region inside one (`method`).
///
/// `start_line`/`end_line` are inclusive, in new-file numbering, and lie
/// within the enclosing hunk's new-side span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusArea {
    pub focus_id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub description: String,
    pub hunk_index: usize,
    /// Annotated diff excerpt: each body line prefixed with `"<new_line>: "`
    /// for additions/context, `"   -: "` for deletions.
    pub hunk_content: String,
    pub focus_type: FocusType,
}
