//! Markdown rendering of a parsed `GitDiff`, for the `diff-parsed.md` /
//! `effective-diff-parsed.md` artifacts (§4.9 directory layout).

use pr_radar_diff::GitDiff;

/// Renders each hunk as a fenced `diff` code block, grouped under a
/// level-2 heading per changed file.
pub fn render_diff_markdown(diff: &GitDiff) -> String {
    let mut out = String::new();
    let mut current_file: Option<&str> = None;

    for hunk in &diff.hunks {
        if current_file != Some(hunk.file_path.as_str()) {
            if current_file.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("## {}\n\n", hunk.file_path));
            if let Some(from) = &hunk.rename_from {
                out.push_str(&format!("renamed from `{from}`\n\n"));
            }
            current_file = Some(&hunk.file_path);
        }

        if hunk.diff_lines.is_empty() {
            continue;
        }

        out.push_str("```diff\n");
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            hunk.old_start, hunk.old_length, hunk.new_start, hunk.new_length
        ));
        for line in &hunk.diff_lines {
            out.push(line.prefix());
            out.push_str(&line.content);
            out.push('\n');
        }
        out.push_str("```\n\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_radar_diff::parse_git_diff;

    #[test]
    fn renders_one_heading_per_file() {
        let diff_text = concat!(
            "diff --git a/foo.rs b/foo.rs\n",
            "--- a/foo.rs\n",
            "+++ b/foo.rs\n",
            "@@ -1,1 +1,1 @@\n",
            "-old\n",
            "+new\n",
        );
        let diff = parse_git_diff(diff_text, "abc").unwrap();
        let md = render_diff_markdown(&diff);
        assert!(md.contains("## foo.rs"));
        assert!(md.contains("-old"));
        assert!(md.contains("+new"));
    }
}
