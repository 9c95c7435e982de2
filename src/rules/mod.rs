//! Rule catalog
//!
//! Per-language, per-category pattern and heuristic checks. The
//! language -> rule-set mapping is a data table built once at startup;
//! adding a language or rule is a table edit, not new control flow.
//!
//! Rules are pure and side-effect-free. A rule that cannot parse its
//! input produces zero issues; it never fails the surrounding analysis.

mod generic;
mod java;
mod javascript;
mod python;
mod yaml;

pub use yaml::is_ansible;

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::language::Language;
use crate::models::{AnalysisCategory, Issue, Severity};

/// A single check from the catalog.
pub struct Rule {
    /// Stable identifier, e.g. `quality.long-line`.
    pub id: &'static str,
    pub category: AnalysisCategory,
    pub severity: Severity,
    pub check: Check,
}

/// How a rule inspects file content.
pub enum Check {
    /// Fires once per line matching the pattern.
    LinePattern {
        pattern: Regex,
        message: &'static str,
    },
    /// Fires once per line longer than `max` characters.
    LineLength { max: usize },
    /// Whole-file heuristic; receives the rule so it can stamp issues
    /// with the right id and severity.
    File(fn(&Rule, &str, &Path) -> Vec<Issue>),
}

impl Rule {
    /// Evaluate this rule against file content.
    pub fn evaluate(&self, content: &str, path: &Path) -> Vec<Issue> {
        match &self.check {
            Check::LinePattern { pattern, message } => content
                .lines()
                .enumerate()
                .filter(|(_, line)| pattern.is_match(line))
                .map(|(idx, _)| self.issue_at(path, idx as u32 + 1, (*message).to_string()))
                .collect(),
            Check::LineLength { max } => content
                .lines()
                .enumerate()
                .filter(|(_, line)| line.chars().count() > *max)
                .map(|(idx, line)| {
                    self.issue_at(
                        path,
                        idx as u32 + 1,
                        format!(
                            "Line is {} characters, exceeds the {}-character limit",
                            line.chars().count(),
                            max
                        ),
                    )
                })
                .collect(),
            Check::File(check) => check(self, content, path),
        }
    }

    /// Build an issue for this rule at a given line.
    pub fn issue_at(&self, path: &Path, line: u32, message: String) -> Issue {
        Issue::internal(
            self.id,
            path,
            Some(line),
            self.category,
            self.severity,
            message,
        )
    }
}

type CatalogKey = (Language, AnalysisCategory);

struct Catalog {
    rules: HashMap<CatalogKey, Vec<Rule>>,
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| {
        let mut rules: HashMap<CatalogKey, Vec<Rule>> = HashMap::new();

        let mut add = |lang: Language, batch: Vec<Rule>| {
            for rule in batch {
                rules.entry((lang, rule.category)).or_default().push(rule);
            }
        };

        // Generic rules apply to every pattern-checked language.
        for lang in [
            Language::Python,
            Language::Javascript,
            Language::Typescript,
            Language::Java,
            Language::Go,
            Language::Yaml,
        ] {
            add(lang, generic::rules());
        }

        add(Language::Python, python::rules());
        add(Language::Javascript, javascript::rules());
        add(Language::Typescript, javascript::rules());
        add(Language::Java, java::rules());
        add(Language::Yaml, yaml::rules());

        Catalog { rules }
    })
}

/// Ordered rule set for a `(language, category)` pair.
///
/// Languages without registered rules (recognition-only tiers and
/// `Unknown`) get an empty set: their files are counted, not checked.
pub fn rules_for(language: Language, category: AnalysisCategory) -> &'static [Rule] {
    catalog()
        .rules
        .get(&(language, category))
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_has_rules_in_every_category() {
        for category in AnalysisCategory::ALL {
            assert!(
                !rules_for(Language::Python, category).is_empty(),
                "python should have {category} rules"
            );
        }
    }

    #[test]
    fn test_unknown_language_has_no_rules() {
        for category in AnalysisCategory::ALL {
            assert!(rules_for(Language::Unknown, category).is_empty());
        }
    }

    #[test]
    fn test_recognition_only_language_has_no_rules() {
        for category in AnalysisCategory::ALL {
            assert!(rules_for(Language::Rust, category).is_empty());
        }
    }

    #[test]
    fn test_rule_ids_are_unique_per_language_category() {
        for lang in [Language::Python, Language::Javascript, Language::Yaml] {
            for category in AnalysisCategory::ALL {
                let rules = rules_for(lang, category);
                let mut ids: Vec<&str> = rules.iter().map(|r| r.id).collect();
                ids.sort_unstable();
                let before = ids.len();
                ids.dedup();
                assert_eq!(before, ids.len(), "duplicate rule id for {lang} {category}");
            }
        }
    }

    #[test]
    fn test_rule_category_matches_catalog_key() {
        for lang in [
            Language::Python,
            Language::Javascript,
            Language::Typescript,
            Language::Java,
            Language::Go,
            Language::Yaml,
        ] {
            for category in AnalysisCategory::ALL {
                for rule in rules_for(lang, category) {
                    assert_eq!(rule.category, category, "rule {} misfiled", rule.id);
                }
            }
        }
    }
}
