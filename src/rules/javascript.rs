//! JavaScript / TypeScript rules
//!
//! Basic-tier pattern checks shared by both languages.

use regex::Regex;

use super::{Check, Rule};
use crate::models::{AnalysisCategory, Severity};

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static rule pattern must compile")
}

pub fn rules() -> Vec<Rule> {
    vec![
        // Security
        Rule {
            id: "security.js.eval",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"\beval\s*\("),
                message: "eval() on dynamic input can lead to code injection",
            },
        },
        Rule {
            id: "security.js.new-function",
            category: AnalysisCategory::Security,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r"new\s+Function\s*\("),
                message: "Dynamic function construction behaves like eval()",
            },
        },
        Rule {
            id: "security.js.inner-html",
            category: AnalysisCategory::Security,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r"\.innerHTML\s*="),
                message: "innerHTML assignment with untrusted data can lead to XSS",
            },
        },
        Rule {
            id: "security.js.document-write",
            category: AnalysisCategory::Security,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r"document\.write\s*\("),
                message: "document.write() with untrusted data can lead to XSS",
            },
        },
        // Quality
        Rule {
            id: "quality.long-line",
            category: AnalysisCategory::Quality,
            severity: Severity::Low,
            check: Check::LineLength { max: 120 },
        },
        Rule {
            id: "quality.js.console-statement",
            category: AnalysisCategory::Quality,
            severity: Severity::Low,
            check: Check::LinePattern {
                pattern: pattern(r"console\.(log|debug|info|warn|error)\s*\("),
                message: "Console statement left in source; remove or route through a logger",
            },
        },
        Rule {
            id: "quality.js.var-usage",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r"\bvar\s+\w+"),
                message: "var declaration; prefer let or const",
            },
        },
        Rule {
            id: "quality.js.loose-equality",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r"[^=!<>]==[^=]"),
                message: "Loose equality (==); prefer strict === comparison",
            },
        },
        // Performance
        Rule {
            id: "performance.js.dom-query-in-loop",
            category: AnalysisCategory::Performance,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(
                    r"(for|while)\s*\(.*(document\.getElementById|document\.querySelector)",
                ),
                message: "DOM query inside a loop header; cache the element outside the loop",
            },
        },
        Rule {
            id: "performance.js.indexof-check",
            category: AnalysisCategory::Performance,
            severity: Severity::Low,
            check: Check::LinePattern {
                pattern: pattern(r"\.indexOf\([^)]*\)\s*[><!=]=?\s*-?1"),
                message: "indexOf() existence check; .includes() is clearer and faster",
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Issue;
    use std::path::Path;

    fn eval_rule(id: &str, content: &str) -> Vec<Issue> {
        rules()
            .iter()
            .find(|r| r.id == id)
            .expect("rule exists")
            .evaluate(content, Path::new("app.js"))
    }

    #[test]
    fn test_console_statement() {
        let issues = eval_rule("quality.js.console-statement", "console.log('debug');\n");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_var_usage() {
        assert_eq!(eval_rule("quality.js.var-usage", "var x = 1;\n").len(), 1);
        assert!(eval_rule("quality.js.var-usage", "let x = 1;\n").is_empty());
    }

    #[test]
    fn test_loose_equality_ignores_strict() {
        assert_eq!(eval_rule("quality.js.loose-equality", "if (a == b) {}\n").len(), 1);
        assert!(eval_rule("quality.js.loose-equality", "if (a === b) {}\n").is_empty());
        assert!(eval_rule("quality.js.loose-equality", "if (a !== b) {}\n").is_empty());
    }

    #[test]
    fn test_inner_html() {
        let issues = eval_rule("security.js.inner-html", "el.innerHTML = userInput;\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Medium);
    }

    #[test]
    fn test_indexof_check() {
        let issues = eval_rule(
            "performance.js.indexof-check",
            "if (xs.indexOf(x) > -1) {}\n",
        );
        assert_eq!(issues.len(), 1);
    }
}
