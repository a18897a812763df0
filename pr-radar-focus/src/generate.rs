//! Focus-area generator (C4), per §4.4.

use std::collections::HashSet;

use pr_radar_diff::GitDiff;
use tracing::debug;

use crate::errors::{FocusError, FocusResult};
use crate::id::focus_id;
use crate::model::{FocusArea, FocusType};
use crate::oracle::SubdivideOracle;
use crate::render::{render_hunk_content, render_range_content};

/// Runs §4.4 end to end: one `file` FocusArea per hunk, plus zero or more
/// `method` FocusAreas from `oracle`. Fails if any two FocusAreas collide on
/// `focus_id` (an invariant violation per §4.4 and §8 table).
pub async fn generate_focus_areas<O: SubdivideOracle>(
    diff: &GitDiff,
    oracle: &O,
) -> FocusResult<Vec<FocusArea>> {
    let mut areas = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (hunk_index, hunk) in diff.hunks.iter().enumerate() {
        let Some((new_start, new_end)) = hunk.new_side_range() else {
            // Pure deletions / renames with no new-side body contribute no
            // focus area: there is nothing in the new file to review.
            continue;
        };

        let file_area = FocusArea {
            focus_id: focus_id(
                &hunk.file_path,
                hunk_index,
                new_start,
                new_end,
                FocusType::File,
            ),
            file_path: hunk.file_path.clone(),
            start_line: new_start,
            end_line: new_end,
            description: format!("{} (full hunk)", hunk.file_path),
            hunk_index,
            hunk_content: render_hunk_content(hunk),
            focus_type: FocusType::File,
        };
        push_unique(&mut areas, &mut seen_ids, file_area)?;

        for hint in oracle.subdivide(hunk).await {
            let start = hint.start_line.max(new_start);
            let end = hint.end_line.min(new_end);
            if start > end {
                debug!(
                    file = %hunk.file_path,
                    hunk_index,
                    "subdivide hint falls outside hunk span; skipping"
                );
                continue;
            }
            let method_area = FocusArea {
                focus_id: focus_id(&hunk.file_path, hunk_index, start, end, FocusType::Method),
                file_path: hunk.file_path.clone(),
                start_line: start,
                end_line: end,
                description: hint.description,
                hunk_index,
                hunk_content: render_range_content(hunk, start, end),
                focus_type: FocusType::Method,
            };
            push_unique(&mut areas, &mut seen_ids, method_area)?;
        }
    }

    Ok(areas)
}

fn push_unique(
    areas: &mut Vec<FocusArea>,
    seen_ids: &mut HashSet<String>,
    area: FocusArea,
) -> FocusResult<()> {
    if !seen_ids.insert(area.focus_id.clone()) {
        return Err(FocusError::DuplicateFocusId(area.focus_id));
    }
    areas.push(area);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{NoSubdivideOracle, SubdivideHint};
    use pr_radar_diff::{parse_git_diff, Hunk};

    const SIMPLE_DIFF: &str = concat!(
        "diff --git a/foo.rs b/foo.rs\n",
        "--- a/foo.rs\n",
        "+++ b/foo.rs\n",
        "@@ -1,2 +1,3 @@\n",
        " fn main() {\n",
        "+    println!(\"hi\");\n",
        " }\n",
    );

    #[tokio::test]
    async fn generates_one_file_area_per_hunk_with_no_oracle() {
        let diff = parse_git_diff(SIMPLE_DIFF, "abc").unwrap();
        let areas = generate_focus_areas(&diff, &NoSubdivideOracle).await.unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].focus_type, FocusType::File);
        assert_eq!(areas[0].start_line, 1);
        assert_eq!(areas[0].end_line, 3);
        assert!(areas[0].hunk_content.contains("2: "));
    }

    struct StubOracle;
    impl SubdivideOracle for StubOracle {
        async fn subdivide(&self, _hunk: &Hunk) -> Vec<SubdivideHint> {
            vec![SubdivideHint {
                start_line: 1,
                end_line: 2,
                description: "main".to_string(),
            }]
        }
    }

    #[tokio::test]
    async fn generates_method_area_from_oracle() {
        let diff = parse_git_diff(SIMPLE_DIFF, "abc").unwrap();
        let areas = generate_focus_areas(&diff, &StubOracle).await.unwrap();
        assert_eq!(areas.len(), 2);
        assert!(areas.iter().any(|a| a.focus_type == FocusType::Method));
        let ids: HashSet<_> = areas.iter().map(|a| a.focus_id.clone()).collect();
        assert_eq!(ids.len(), areas.len());
    }
}
