//! The subdividing oracle: an external, language-aware collaborator that
//! proposes method-level `FocusArea`s inside a hunk. Generation is
//! language-agnostic at this layer per §4.4 — without a configured oracle,
//! method-level generation is simply skipped.

use pr_radar_diff::Hunk;

/// One candidate subdivision: an inclusive new-file line range plus a short
/// human-readable description (e.g. a method or symbol name).
#[derive(Debug, Clone)]
pub struct SubdivideHint {
    pub start_line: u32,
    pub end_line: u32,
    pub description: String,
}

/// `(hunk) -> [(start_line, end_line, description)]`.
///
/// Native `async fn` in trait, matching the teacher's no-`async-trait`,
/// no-`dyn` discipline.
pub trait SubdivideOracle {
    async fn subdivide(&self, hunk: &Hunk) -> Vec<SubdivideHint>;
}

/// The default oracle: produces no method-level hints. A caller configuring
/// no subdivider gets only `file`-level focus areas, per §4.4.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSubdivideOracle;

impl SubdivideOracle for NoSubdivideOracle {
    async fn subdivide(&self, _hunk: &Hunk) -> Vec<SubdivideHint> {
        Vec::new()
    }
}
