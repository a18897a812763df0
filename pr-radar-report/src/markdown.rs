//! Markdown rendering of an `AnalysisSummary`, in the teacher's
//! `to_markdown` style (`review::mod::to_markdown`/`write_report`).

use crate::model::AnalysisSummary;

pub fn render_markdown(summary: &AnalysisSummary) -> String {
    let mut out = String::new();
    out.push_str("# PR Radar Report\n\n");
    out.push_str(&format!(
        "**{} violation(s)** across {} file(s), {} rule(s).\n\n",
        summary.total_violations,
        summary.by_file.len(),
        summary.by_rule.len(),
    ));

    if let Some(cost) = summary.total_cost_usd {
        out.push_str(&format!("Total cost: ${cost:.4}\n\n"));
    }

    out.push_str("## By severity\n\n");
    for sev in ["Severe", "Moderate", "Minor"] {
        let count = summary.by_severity.get(sev).copied().unwrap_or(0);
        out.push_str(&format!("- **{sev}**: {count}\n"));
    }
    out.push('\n');

    out.push_str("## Violations\n\n");
    for v in &summary.violations {
        let location = match v.line_number {
            Some(line) => format!("{}:{}", v.file_path, line),
            None => v.file_path.clone(),
        };
        out.push_str(&format!(
            "### [{}] {} — score {}\n\n{}\n\n",
            v.severity.as_str(),
            location,
            v.score,
            v.comment,
        ));
    }

    out
}
