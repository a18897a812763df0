//! Annotated hunk-excerpt rendering, in the style of
//! `mr-reviewer::review::context::chunk::extract_lines` but emitting
//! per-line number prefixes instead of a bare join.

use pr_radar_diff::{DiffLineKind, Hunk};

/// Renders every body line of `hunk` prefixed with its new-file line number
/// (`"<new_line>: "`), or `"   -: "` for a pure deletion that has no new-side
/// line.
pub fn render_hunk_content(hunk: &Hunk) -> String {
    hunk.diff_lines
        .iter()
        .map(|dl| match dl.kind {
            DiffLineKind::Removed => format!("   -: {}", dl.content),
            _ => format!(
                "{}: {}",
                dl.new_line_number.unwrap_or_default(),
                dl.content
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders only the body lines whose new-file line number falls within
/// `[start_line, end_line]`, plus every deletion line in the hunk (deletions
/// carry no new-side line number, so they are always included — they sit
/// adjacent to whatever range they were deleted next to).
pub fn render_range_content(hunk: &Hunk, start_line: u32, end_line: u32) -> String {
    hunk.diff_lines
        .iter()
        .filter(|dl| match dl.new_line_number {
            Some(n) => n >= start_line && n <= end_line,
            None => true,
        })
        .map(|dl| match dl.kind {
            DiffLineKind::Removed => format!("   -: {}", dl.content),
            _ => format!(
                "{}: {}",
                dl.new_line_number.unwrap_or_default(),
                dl.content
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
