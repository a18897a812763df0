//! Rule data model and `applies_to`/`grep` matching, per §4.5.

use serde::{Deserialize, Serialize};

use pr_radar_focus::FocusType;

use crate::errors::{RuleError, RuleResult};
use crate::glob::GlobMatcher;

/// Path-pattern filter. Empty/absent pattern lists mean "match everything".
/// Exclusion takes precedence over inclusion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppliesTo {
    #[serde(default)]
    pub file_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Content-regex filter. `grep` passes iff every `all` pattern matches and
/// at least one `any` pattern matches (both lists default to "pass" when
/// empty).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grep {
    #[serde(default)]
    pub all: Vec<String>,
    #[serde(default)]
    pub any: Vec<String>,
}

/// A review rule: a named prompt body plus the file/content filters that
/// gate when it applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub category: String,
    pub description: String,
    /// Body prompt handed to the evaluation oracle.
    pub content: String,
    pub focus_type: FocusType,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub documentation_link: Option<String>,
    #[serde(default)]
    pub rule_url: Option<String>,
    /// Related skill slug rendered as `Related Claude Skill: /<skill>` in
    /// the posted comment body, when present (§4.8).
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub applies_to: Option<AppliesTo>,
    #[serde(default)]
    pub grep: Option<Grep>,

    /// Precompiled matchers, built once at load time (mirrors the teacher's
    /// precompile-regex-at-parse-time discipline in `review/policy.rs`).
    /// `pub(crate)` so constructors outside this module (the YAML loader)
    /// can build a `Rule` before `compile()` fills this in.
    #[serde(skip)]
    pub(crate) compiled: CompiledMatchers,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledMatchers {
    include: Vec<GlobMatcher>,
    exclude: Vec<GlobMatcher>,
    grep_all: Vec<regex::Regex>,
    grep_any: Vec<regex::Regex>,
}

/// A minimal subset of `Rule` suitable for evaluation: the fields an
/// `EvaluationTask` actually needs, without the matching machinery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRule {
    pub name: String,
    pub category: String,
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub documentation_link: Option<String>,
    #[serde(default)]
    pub rule_url: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
}

impl Rule {
    /// Builds an uncompiled `Rule`; callers must invoke `.compile()` before
    /// using `applies_to_file`/`matches_diff_content`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
        focus_type: FocusType,
        model: Option<String>,
        documentation_link: Option<String>,
        rule_url: Option<String>,
        skill: Option<String>,
        applies_to: Option<AppliesTo>,
        grep: Option<Grep>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: description.into(),
            content: content.into(),
            focus_type,
            model,
            documentation_link,
            rule_url,
            skill,
            applies_to,
            grep,
            compiled: CompiledMatchers::default(),
        }
    }

    /// Compiles `applies_to`/`grep` patterns once; call immediately after
    /// deserializing or hand-constructing a `Rule`.
    pub fn compile(mut self) -> RuleResult<Self> {
        let applies_to = self.applies_to.clone().unwrap_or_default();
        let include = applies_to
            .file_patterns
            .iter()
            .map(|p| GlobMatcher::compile(p))
            .collect::<RuleResult<Vec<_>>>()?;
        let exclude = applies_to
            .exclude_patterns
            .iter()
            .map(|p| GlobMatcher::compile(p))
            .collect::<RuleResult<Vec<_>>>()?;

        let grep = self.grep.clone().unwrap_or_default();
        let grep_all = grep
            .all
            .iter()
            .map(|p| compile_multiline(&self.name, p))
            .collect::<RuleResult<Vec<_>>>()?;
        let grep_any = grep
            .any
            .iter()
            .map(|p| compile_multiline(&self.name, p))
            .collect::<RuleResult<Vec<_>>>()?;

        self.compiled = CompiledMatchers {
            include,
            exclude,
            grep_all,
            grep_any,
        };
        Ok(self)
    }

    /// Glob-matches `applies_to.file_patterns`/`exclude_patterns` against
    /// `path`. Exclusion wins over inclusion.
    pub fn applies_to_file(&self, path: &str) -> bool {
        if self.compiled.exclude.iter().any(|g| g.is_match(path)) {
            return false;
        }
        if self.compiled.include.is_empty() {
            return true;
        }
        self.compiled.include.iter().any(|g| g.is_match(path))
    }

    /// Regex-matches `grep.all`/`grep.any` against `content` (multiline,
    /// anchors match line boundaries).
    pub fn matches_diff_content(&self, content: &str) -> bool {
        let all_pass = self.compiled.grep_all.iter().all(|r| r.is_match(content));
        let any_pass = self.compiled.grep_any.is_empty()
            || self.compiled.grep_any.iter().any(|r| r.is_match(content));
        all_pass && any_pass
    }

    pub fn as_task_rule(&self) -> TaskRule {
        TaskRule {
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            content: self.content.clone(),
            model: self.model.clone(),
            documentation_link: self.documentation_link.clone(),
            rule_url: self.rule_url.clone(),
            skill: self.skill.clone(),
        }
    }
}

fn compile_multiline(rule_name: &str, pattern: &str) -> RuleResult<regex::Regex> {
    regex::RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| RuleError::InvalidRegex {
            rule_name: rule_name.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}
