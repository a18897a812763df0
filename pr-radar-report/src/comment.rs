//! PR comment composition (§4.8 body template) and posting-payload shape
//! (§6): a pure transform from `Violation` to the text/JSON an external
//! poster sends.

use serde::{Deserialize, Serialize};

use pr_radar_diff::GitDiff;

use crate::model::Violation;

/// Renders the body template from §4.8:
///
/// ```text
/// **[<rule_name>](<rule_url>)**            (or **<rule_name>** when absent)
///
/// <comment>
///
/// Related Claude Skill: `/<skill>`            (if present)
/// Related Documentation: [Docs](<doc_link>)   (if present)
///
/// *Assisted by PR Radar (cost $X.XXXX · <model>)*
/// ```
pub fn build_comment_body(v: &Violation) -> String {
    let mut out = String::new();

    match &v.rule_url {
        Some(url) => out.push_str(&format!("**[{}]({})**\n\n", v.rule_name, url)),
        None => out.push_str(&format!("**{}**\n\n", v.rule_name)),
    }

    out.push_str(&v.comment);
    out.push_str("\n\n");

    if let Some(skill) = &v.skill {
        out.push_str(&format!("Related Claude Skill: `/{skill}`\n"));
    }
    if let Some(doc) = &v.documentation_link {
        out.push_str(&format!("Related Documentation: [Docs]({doc})\n"));
    }
    if v.skill.is_some() || v.documentation_link.is_some() {
        out.push('\n');
    }

    let cost = v.cost_usd.map(|c| format!("cost ${c:.4} · ")).unwrap_or_default();
    out.push_str(&format!("*Assisted by PR Radar ({cost}{})*", v.model_used));

    out
}

/// Inline-vs-file-level comment payload for an external poster, per §6.
/// Line numbers are new-side as produced by C1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentPayload {
    Inline {
        commit_id: String,
        path: String,
        side: String,
        line: u32,
        body: String,
    },
    General {
        body: String,
    },
}

/// Builds the posting payload for `violation`. A violation whose line does
/// not fall within a surviving hunk of `diff` is downgraded to a
/// file-/PR-level comment, per §6.
pub fn build_comment_payload(commit_id: &str, v: &Violation, diff: &GitDiff) -> CommentPayload {
    let body = build_comment_body(v);

    let Some(line) = v.line_number else {
        return CommentPayload::General { body };
    };

    let covered = diff
        .hunks_for_file(&v.file_path)
        .any(|h| h.new_side_range().is_some_and(|(s, e)| line >= s && line <= e));

    if covered {
        CommentPayload::Inline {
            commit_id: commit_id.to_string(),
            path: v.file_path.clone(),
            side: "RIGHT".to_string(),
            line,
            body,
        }
    } else {
        CommentPayload::General { body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use pr_radar_diff::parse_git_diff;

    fn sample_violation(line: Option<u32>) -> Violation {
        Violation {
            task_id: "r_abc".to_string(),
            rule_name: "no-force-unwrap".to_string(),
            rule_url: Some("https://example.com/rules/no-force-unwrap".to_string()),
            documentation_link: Some("https://example.com/docs".to_string()),
            skill: Some("review-force-unwrap".to_string()),
            file_path: "foo.rs".to_string(),
            line_number: line,
            score: 8,
            comment: "avoid force unwrap here".to_string(),
            method: None,
            severity: Severity::Severe,
            model_used: "gpt-test".to_string(),
            cost_usd: Some(0.0123),
        }
    }

    #[test]
    fn renders_expected_template_shape() {
        let body = build_comment_body(&sample_violation(Some(2)));
        assert!(body.starts_with("**[no-force-unwrap]"));
        assert!(body.contains("avoid force unwrap here"));
        assert!(body.contains("Related Claude Skill: `/review-force-unwrap`"));
        assert!(body.contains("Related Documentation"));
        assert!(body.contains("Assisted by PR Radar (cost $0.0123 · gpt-test)"));
    }

    #[test]
    fn downgrades_to_general_when_line_outside_surviving_hunks() {
        let diff_text = concat!(
            "diff --git a/foo.rs b/foo.rs\n",
            "--- a/foo.rs\n",
            "+++ b/foo.rs\n",
            "@@ -1,1 +1,1 @@\n",
            "-old\n",
            "+new\n",
        );
        let diff = parse_git_diff(diff_text, "abc").unwrap();
        let payload = build_comment_payload("abc", &sample_violation(Some(99)), &diff);
        assert!(matches!(payload, CommentPayload::General { .. }));
    }

    #[test]
    fn stays_inline_when_line_is_covered() {
        let diff_text = concat!(
            "diff --git a/foo.rs b/foo.rs\n",
            "--- a/foo.rs\n",
            "+++ b/foo.rs\n",
            "@@ -1,1 +1,1 @@\n",
            "-old\n",
            "+new\n",
        );
        let diff = parse_git_diff(diff_text, "abc").unwrap();
        let payload = build_comment_payload("abc", &sample_violation(Some(1)), &diff);
        assert!(matches!(payload, CommentPayload::Inline { .. }));
    }
}
