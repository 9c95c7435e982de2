//! Python rules
//!
//! Python is the full-support language: in addition to pattern rules it
//! gets lightweight tree-sitter walks for structural quality checks
//! (argument counts, docstrings, nesting depth).

use regex::Regex;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use super::{Check, Rule};
use crate::models::{AnalysisCategory, Issue, Severity};

const MAX_ARGUMENTS: usize = 7;
const MAX_NESTING: usize = 4;
/// Functions shorter than this are not required to carry a docstring.
const DOCSTRING_MIN_LINES: usize = 5;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static rule pattern must compile")
}

pub fn rules() -> Vec<Rule> {
    vec![
        // Security
        Rule {
            id: "security.python.eval",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"\beval\s*\("),
                message: "eval() on dynamic input can lead to code injection",
            },
        },
        Rule {
            id: "security.python.exec",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"\bexec\s*\("),
                message: "exec() on dynamic input can lead to code injection",
            },
        },
        Rule {
            id: "security.python.os-system",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"os\.system\s*\("),
                message: "os.system() can lead to command injection; use subprocess with a list argument",
            },
        },
        Rule {
            id: "security.python.subprocess-shell",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"subprocess\.\w+\s*\([^)]*shell\s*=\s*True"),
                message: "subprocess with shell=True can lead to shell injection",
            },
        },
        Rule {
            id: "security.python.pickle-load",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::LinePattern {
                pattern: pattern(r"pickle\.loads?\s*\("),
                message: "Unpickling untrusted data can execute arbitrary code",
            },
        },
        Rule {
            id: "security.python.yaml-load",
            category: AnalysisCategory::Security,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r"yaml\.load\s*\("),
                message: "yaml.load() without a safe loader can construct arbitrary objects; use yaml.safe_load()",
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
            id: "quality.python.too-many-arguments",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::File(check_too_many_arguments),
        },
        Rule {
            id: "quality.python.missing-docstring",
            category: AnalysisCategory::Quality,
            severity: Severity::Low,
            check: Check::File(check_missing_docstrings),
        },
        Rule {
            id: "quality.python.deep-nesting",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::File(check_deep_nesting),
        },
        // Performance
        Rule {
            id: "performance.python.string-concat-loop",
            category: AnalysisCategory::Performance,
            severity: Severity::Medium,
            check: Check::File(check_string_concat_in_loop),
        },
        Rule {
            id: "performance.python.append-in-loop",
            category: AnalysisCategory::Performance,
            severity: Severity::Low,
            check: Check::LinePattern {
                pattern: pattern(r"for\s+\w+\s+in\s+.*:\s*\w+\.append\("),
                message: "Single-statement append loop; a list comprehension is faster",
            },
        },
    ]
}

// ---------------------------------------------------------------------------
// Tree-sitter structural checks
// ---------------------------------------------------------------------------

fn parse_python(content: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .ok()?;
    parser.parse(content, None)
}

/// Visit every function_definition in the tree.
fn for_each_function(root: Node, mut visit: impl FnMut(Node)) {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "function_definition" {
            visit(node);
        }
        for child in node.named_children(&mut cursor) {
            stack.push(child);
        }
    }
}

fn check_too_many_arguments(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    let Some(tree) = parse_python(content) else {
        debug!("could not parse {} as python", path.display());
        return Vec::new();
    };

    let mut issues = Vec::new();
    for_each_function(tree.root_node(), |func| {
        let Some(params) = func.child_by_field_name("parameters") else {
            return;
        };
        let count = params.named_child_count();
        if count > MAX_ARGUMENTS {
            let line = func.start_position().row as u32 + 1;
            issues.push(rule.issue_at(
                path,
                line,
                format!("Function takes {count} arguments (max recommended: {MAX_ARGUMENTS})"),
            ));
        }
    });
    issues
}

fn check_missing_docstrings(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    let Some(tree) = parse_python(content) else {
        debug!("could not parse {} as python", path.display());
        return Vec::new();
    };

    let mut issues = Vec::new();
    for_each_function(tree.root_node(), |func| {
        let Some(body) = func.child_by_field_name("body") else {
            return;
        };

        let span = body.end_position().row.saturating_sub(body.start_position().row) + 1;
        if span < DOCSTRING_MIN_LINES {
            return;
        }

        let has_docstring = body
            .named_child(0)
            .filter(|first| first.kind() == "expression_statement")
            .and_then(|first| first.named_child(0))
            .map(|expr| expr.kind() == "string")
            .unwrap_or(false);

        if !has_docstring {
            let line = func.start_position().row as u32 + 1;
            let name = func
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(content.as_bytes()).ok())
                .unwrap_or("<anonymous>");
            issues.push(rule.issue_at(
                path,
                line,
                format!("Function '{name}' spans {span} lines but has no docstring"),
            ));
        }
    });
    issues
}

const NESTING_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
    "match_statement",
];

fn max_depth(node: Node, current: usize) -> usize {
    let mut cursor = node.walk();
    let mut deepest = current;
    for child in node.named_children(&mut cursor) {
        let next = if NESTING_KINDS.contains(&child.kind()) {
            current + 1
        } else {
            current
        };
        deepest = deepest.max(max_depth(child, next));
    }
    deepest
}

fn check_deep_nesting(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    let Some(tree) = parse_python(content) else {
        debug!("could not parse {} as python", path.display());
        return Vec::new();
    };

    let mut issues = Vec::new();
    for_each_function(tree.root_node(), |func| {
        let Some(body) = func.child_by_field_name("body") else {
            return;
        };
        let depth = max_depth(body, 0);
        if depth > MAX_NESTING {
            let line = func.start_position().row as u32 + 1;
            issues.push(rule.issue_at(
                path,
                line,
                format!("Control flow nested {depth} levels deep (max recommended: {MAX_NESTING})"),
            ));
        }
    });
    issues
}

// ---------------------------------------------------------------------------
// Indentation-based loop heuristics
// ---------------------------------------------------------------------------

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || c == &'\t').count()
}

/// Flag `+=` string building inside a for/while body. Tracks loop headers
/// by indentation, so only statements actually inside a loop block fire.
fn check_string_concat_in_loop(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    let loop_header = pattern(r"^\s*(for|while)\b.*:");
    let concat = pattern(r"\w\s*\+=\s*");

    let mut issues = Vec::new();
    let mut loop_stack: Vec<usize> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);
        while let Some(&loop_indent) = loop_stack.last() {
            if indent <= loop_indent {
                loop_stack.pop();
            } else {
                break;
            }
        }

        if !loop_stack.is_empty() && concat.is_match(line) {
            issues.push(rule.issue_at(
                path,
                idx as u32 + 1,
                "Accumulating with += inside a loop; collect parts and join instead".to_string(),
            ));
        }

        if loop_header.is_match(line) {
            loop_stack.push(indent);
        }
    }
    issues
}
