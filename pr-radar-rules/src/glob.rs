//! Manual glob-to-regex compilation, per §9's design note and §4.5: `*`
//! matches any run of non-`/`, `**` matches zero or more path components,
//! `?` matches one non-`/`. Patterns without `/` match the basename only;
//! patterns with `/` match the full path.

use regex::Regex;

use crate::errors::{RuleError, RuleResult};

#[derive(Debug, Clone)]
pub struct GlobMatcher {
    regex: Regex,
    basename_only: bool,
}

impl GlobMatcher {
    pub fn compile(pattern: &str) -> RuleResult<Self> {
        let basename_only = !pattern.contains('/');
        let anchored = format!("^{}$", glob_to_regex(pattern));
        let regex = Regex::new(&anchored).map_err(|source| RuleError::InvalidRegex {
            rule_name: "<applies_to>".to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            basename_only,
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        if self.basename_only {
            let basename = path.rsplit('/').next().unwrap_or(path);
            self.regex.is_match(basename)
        } else {
            self.regex.is_match(path)
        }
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    // `**`: consume an optional trailing `/` so
                    // `a/**/b` also matches `a/b`.
                    if chars.get(i + 2) == Some(&'/') {
                        out.push_str("(?:.*/)?");
                        i += 3;
                        continue;
                    }
                    out.push_str(".*");
                    i += 2;
                    continue;
                }
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_double_star_any_depth() {
        let m = GlobMatcher::compile("**/*.swift").unwrap();
        assert!(m.is_match("Views/X.swift"));
        assert!(m.is_match("X.swift"));
        assert!(!m.is_match("X.kt"));
    }

    #[test]
    fn basename_only_pattern_ignores_directory() {
        let m = GlobMatcher::compile("*.rs").unwrap();
        assert!(m.is_match("src/lib.rs"));
        assert!(!m.is_match("src/lib.rs.bak"));
    }

    #[test]
    fn full_path_pattern_requires_directory_match() {
        let m = GlobMatcher::compile("src/*.rs").unwrap();
        assert!(m.is_match("src/lib.rs"));
        assert!(!m.is_match("other/lib.rs"));
    }
}
