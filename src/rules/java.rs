//! Java rules
//!
//! Basic-tier pattern checks.

use regex::Regex;

use super::{Check, Rule};
use crate::models::{AnalysisCategory, Severity};

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static rule pattern must compile")
}

pub fn rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "security.java.runtime-exec",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"Runtime\.getRuntime\(\)\.exec\s*\("),
                message: "Runtime.exec() with untrusted input can lead to command injection",
            },
        },
        Rule {
            id: "quality.long-line",
            category: AnalysisCategory::Quality,
            severity: Severity::Low,
            check: Check::LineLength { max: 120 },
        },
        Rule {
            id: "quality.java.system-out",
            category: AnalysisCategory::Quality,
            severity: Severity::Low,
            check: Check::LinePattern {
                pattern: pattern(r"System\.out\.println\s*\("),
                message: "System.out.println left in source; use a logging framework",
            },
        },
        Rule {
            id: "quality.java.empty-catch",
            category: AnalysisCategory::Quality,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"catch\s*\([^)]+\)\s*\{\s*\}"),
                message: "Empty catch block swallows the exception; handle or log it",
            },
        },
        Rule {
            id: "performance.java.string-concat-loop",
            category: AnalysisCategory::Performance,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r#"(for|while)\s*\(.*\)\s*.*\+=\s*""#),
                message: "String concatenation in a loop; use StringBuilder",
            },
        },
    ]
}
