//! Minimal YAML-subset parser for rule frontmatter, per §4.5: top-level
//! scalar/list/dict-of-scalars-and-lists with single-level nesting; unknown
//! keys are ignored. Not a general YAML parser — deliberately narrow to the
//! shape `Rule` needs.

use std::path::Path;

use crate::errors::{RuleError, RuleResult};
use crate::model::{AppliesTo, Grep, Rule};

/// One parsed top-level YAML value: a scalar, a flat list of scalars, or a
/// dict of scalars-and-lists (one level deep).
enum Value {
    Scalar(String),
    List(Vec<String>),
    Dict(Vec<(String, Value)>),
}

pub fn parse_yaml_subset(yaml: &str, path: &Path) -> RuleResult<Rule> {
    let entries = parse_block(yaml, 0, path)?;

    let mut category = None;
    let mut description = None;
    let mut focus_type_raw = None;
    let mut model = None;
    let mut documentation_link = None;
    let mut rule_url = None;
    let mut skill = None;
    let mut applies_to = None;
    let mut grep = None;

    for (key, value) in entries {
        match key.as_str() {
            "category" => category = Some(expect_scalar(&value, &key, path)?),
            "description" => description = Some(expect_scalar(&value, &key, path)?),
            "focus_type" => focus_type_raw = Some(expect_scalar(&value, &key, path)?),
            "model" => model = Some(expect_scalar(&value, &key, path)?),
            "documentation_link" => documentation_link = Some(expect_scalar(&value, &key, path)?),
            "rule_url" => rule_url = Some(expect_scalar(&value, &key, path)?),
            "skill" => skill = Some(expect_scalar(&value, &key, path)?),
            "applies_to" => applies_to = Some(parse_applies_to(&value, path)?),
            "grep" => grep = Some(parse_grep(&value, path)?),
            _ => {} // unknown keys are ignored, per §4.5
        }
    }

    let focus_type_raw = focus_type_raw.ok_or_else(|| RuleError::Malformed {
        path: path.to_path_buf(),
        reason: "missing required `focus_type` field".to_string(),
    })?;
    let focus_type = match focus_type_raw.as_str() {
        "file" => pr_radar_focus::FocusType::File,
        "method" => pr_radar_focus::FocusType::Method,
        other => {
            return Err(RuleError::Malformed {
                path: path.to_path_buf(),
                reason: format!("unrecognized focus_type {other:?}"),
            })
        }
    };

    Ok(Rule {
        name: String::new(),
        category: category.unwrap_or_default(),
        description: description.unwrap_or_default(),
        content: String::new(),
        focus_type,
        model,
        documentation_link,
        rule_url,
        skill,
        applies_to,
        grep,
        compiled: Default::default(),
    })
}

fn expect_scalar(value: &Value, key: &str, path: &Path) -> RuleResult<String> {
    match value {
        Value::Scalar(s) => Ok(s.clone()),
        _ => Err(RuleError::Malformed {
            path: path.to_path_buf(),
            reason: format!("expected scalar for key {key:?}"),
        }),
    }
}

fn parse_applies_to(value: &Value, path: &Path) -> RuleResult<AppliesTo> {
    let Value::Dict(entries) = value else {
        return Err(RuleError::Malformed {
            path: path.to_path_buf(),
            reason: "expected a mapping for `applies_to`".to_string(),
        });
    };
    let mut applies_to = AppliesTo::default();
    for (key, v) in entries {
        match key.as_str() {
            "file_patterns" => applies_to.file_patterns = expect_list(v, key, path)?,
            "exclude_patterns" => applies_to.exclude_patterns = expect_list(v, key, path)?,
            _ => {}
        }
    }
    Ok(applies_to)
}

fn parse_grep(value: &Value, path: &Path) -> RuleResult<Grep> {
    let Value::Dict(entries) = value else {
        return Err(RuleError::Malformed {
            path: path.to_path_buf(),
            reason: "expected a mapping for `grep`".to_string(),
        });
    };
    let mut grep = Grep::default();
    for (key, v) in entries {
        match key.as_str() {
            "all" => grep.all = expect_list(v, key, path)?,
            "any" => grep.any = expect_list(v, key, path)?,
            _ => {}
        }
    }
    Ok(grep)
}

fn expect_list(value: &Value, key: &str, path: &Path) -> RuleResult<Vec<String>> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Scalar(s) => Ok(vec![s.clone()]),
        Value::Dict(_) => Err(RuleError::Malformed {
            path: path.to_path_buf(),
            reason: format!("expected a list for key {key:?}"),
        }),
    }
}

/// Splits a flow list's inner text on top-level commas, respecting quotes so
/// a comma inside `"a, b"` doesn't split the item. Empty (whitespace-only)
/// input yields no items, so `key: []` parses as an empty list.
fn split_flow_list(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ',' => {
                items.push(current.trim().to_string());
                current = String::new();
            }
            None => current.push(c),
        }
    }
    if !current.trim().is_empty() || !items.is_empty() {
        items.push(current.trim().to_string());
    }
    items
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Parses a block of lines at `base_indent`, where each entry is either
/// `key: scalar`, `key:` followed by an indented nested block (list items
/// `- value` or further `key: value` pairs), producing one level of
/// dict-of-scalars-and-lists nesting.
fn parse_block(yaml: &str, base_indent: usize, path: &Path) -> RuleResult<Vec<(String, Value)>> {
    let lines: Vec<&str> = yaml
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .collect();

    let mut entries = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let indent = indent_of(line);
        if indent != base_indent {
            i += 1;
            continue;
        }
        let trimmed = line.trim_start();
        let Some(colon) = trimmed.find(':') else {
            return Err(RuleError::Malformed {
                path: path.to_path_buf(),
                reason: format!("expected `key: value` line, found {trimmed:?}"),
            });
        };
        let key = trimmed[..colon].trim().to_string();
        let rest = trimmed[colon + 1..].trim();

        if let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let items = split_flow_list(inner).into_iter().map(|s| unquote(&s)).collect();
            entries.push((key, Value::List(items)));
            i += 1;
            continue;
        }

        if !rest.is_empty() {
            entries.push((key, Value::Scalar(unquote(rest))));
            i += 1;
            continue;
        }

        // Nested block: collect following more-indented lines.
        let mut j = i + 1;
        let mut nested_lines = Vec::new();
        while j < lines.len() && indent_of(lines[j]) > base_indent {
            nested_lines.push(lines[j]);
            j += 1;
        }

        if nested_lines.iter().all(|l| l.trim_start().starts_with('-')) && !nested_lines.is_empty()
        {
            let items = nested_lines
                .iter()
                .map(|l| unquote(l.trim_start().trim_start_matches('-').trim()))
                .collect();
            entries.push((key, Value::List(items)));
        } else {
            let nested_indent = nested_lines.first().map(|l| indent_of(l)).unwrap_or(base_indent + 2);
            let nested_yaml = nested_lines.join("\n");
            let nested = parse_block(&nested_yaml, nested_indent, path)?;
            entries.push((key, Value::Dict(nested)));
        }

        i = j;
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_lists_and_dicts() {
        let yaml = concat!(
            "category: style\n",
            "description: example\n",
            "focus_type: file\n",
            "applies_to:\n",
            "  file_patterns:\n",
            "    - \"*.rs\"\n",
            "  exclude_patterns:\n",
            "    - \"*.gen.rs\"\n",
            "grep:\n",
            "  all:\n",
            "    - \"^fn \"\n",
        );
        let rule = parse_yaml_subset(yaml, Path::new("rule.md")).unwrap();
        assert_eq!(rule.category, "style");
        let applies_to = rule.applies_to.unwrap();
        assert_eq!(applies_to.file_patterns, vec!["*.rs"]);
        assert_eq!(applies_to.exclude_patterns, vec!["*.gen.rs"]);
        let grep = rule.grep.unwrap();
        assert_eq!(grep.all, vec!["^fn "]);
    }

    #[test]
    fn parses_flow_lists() {
        let yaml = concat!(
            "category: style\n",
            "description: example\n",
            "focus_type: file\n",
            "applies_to:\n",
            "  file_patterns: [\"*.rs\", \"*.ts\"]\n",
        );
        let rule = parse_yaml_subset(yaml, Path::new("rule.md")).unwrap();
        let applies_to = rule.applies_to.unwrap();
        assert_eq!(applies_to.file_patterns, vec!["*.rs", "*.ts"]);
    }
}
