//! Rule directory loader, per §4.5.
//!
//! Each rule file is either markdown with `---`-delimited YAML frontmatter
//! followed by a body, or a `.json` serialization of the full `Rule`. A file
//! whose body starts with `> **SKIPPED:**` is excluded entirely.

use std::path::Path;

use tracing::debug;

use crate::errors::{RuleError, RuleResult};
use crate::model::Rule;
use crate::yaml::parse_yaml_subset;

/// Walks `dir` recursively and loads every `.md`/`.json` rule file found,
/// skipping `> **SKIPPED:**`-marked files. The rule `name` is its path
/// relative to `dir` with the extension stripped, path separators
/// preserved.
pub fn load_rules(dir: &Path) -> RuleResult<Vec<Rule>> {
    let mut rules = Vec::new();
    walk(dir, dir, &mut rules)?;
    rules.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rules)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<Rule>) -> RuleResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| RuleError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| RuleError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            walk(root, &path, out)?;
            continue;
        }

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };

        match ext {
            "md" => {
                if let Some(rule) = load_markdown_rule(root, &path)? {
                    out.push(rule);
                }
            }
            "json" => {
                out.push(load_json_rule(root, &path)?);
            }
            _ => continue,
        }
    }

    Ok(())
}

fn rule_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let without_ext = relative.with_extension("");
    without_ext.to_string_lossy().replace('\\', "/")
}

fn load_markdown_rule(root: &Path, path: &Path) -> RuleResult<Option<Rule>> {
    let raw = std::fs::read_to_string(path).map_err(|source| RuleError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let (frontmatter, body) = split_frontmatter(&raw).ok_or_else(|| RuleError::Malformed {
        path: path.to_path_buf(),
        reason: "missing `---`-delimited YAML frontmatter".to_string(),
    })?;

    if body.trim_start().starts_with("> **SKIPPED:**") {
        debug!(path = %path.display(), "rule file marked SKIPPED; excluding");
        return Ok(None);
    }

    let mut rule = parse_yaml_subset(frontmatter, path)?;
    rule.name = rule_name(root, path);
    rule.content = body.trim().to_string();

    Ok(Some(rule.compile()?))
}

fn load_json_rule(root: &Path, path: &Path) -> RuleResult<Rule> {
    let raw = std::fs::read_to_string(path).map_err(|source| RuleError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rule: Rule = serde_json::from_str(&raw).map_err(|source| RuleError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    rule.name = rule_name(root, path);
    rule.compile()
}

/// Splits `---\n<yaml>\n---\n<body>` into `(yaml, body)`.
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end = rest.find("\n---")?;
    let yaml = &rest[..end];
    let after = &rest[end + 4..];
    let body = after.strip_prefix('\n').unwrap_or(after);
    Some((yaml, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn loads_markdown_rule_with_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "security/no-secrets.md",
            concat!(
                "---\n",
                "category: security\n",
                "description: flags hardcoded secrets\n",
                "focus_type: method\n",
                "applies_to:\n",
                "  file_patterns:\n",
                "    - \"**/*.swift\"\n",
                "grep:\n",
                "  any:\n",
                "    - \"@MainActor\"\n",
                "---\n",
                "Flag any hardcoded API key or secret.\n",
            ),
        );

        let rules = load_rules(dir.path()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "security/no-secrets");
        assert!(rules[0].applies_to_file("Views/X.swift"));
        assert!(rules[0].matches_diff_content("@MainActor func foo() {}"));
    }

    #[test]
    fn skipped_rule_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "disabled.md",
            concat!(
                "---\n",
                "category: misc\n",
                "description: disabled rule\n",
                "focus_type: file\n",
                "---\n",
                "> **SKIPPED:** no longer relevant\n",
            ),
        );

        let rules = load_rules(dir.path()).unwrap();
        assert!(rules.is_empty());
    }
}
