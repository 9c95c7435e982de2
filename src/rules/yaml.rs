//! YAML rules
//!
//! Surface checks for any YAML file plus a set of Ansible-specific rules.
//! Ansible detection is heuristic: three or more playbook keywords in the
//! file body. Ansible rules are whole-file checks gated on that heuristic,
//! so plain YAML never pays for them.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::{Check, Rule};
use crate::models::{AnalysisCategory, Issue, Severity};

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static rule pattern must compile")
}

const ANSIBLE_KEYWORDS: &[&str] = &[
    "hosts:",
    "tasks:",
    "handlers:",
    "vars:",
    "roles:",
    "become:",
    "gather_facts:",
    "with_items:",
    "when:",
    "notify:",
    "register:",
];

/// A YAML file is treated as Ansible when several playbook keywords appear.
pub fn is_ansible(content: &str) -> bool {
    ANSIBLE_KEYWORDS
        .iter()
        .filter(|k| content.contains(**k))
        .count()
        >= 3
}

pub fn rules() -> Vec<Rule> {
    vec![
        // Quality: plain YAML surface checks
        Rule {
            id: "quality.yaml.tabs",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::LinePattern {
                pattern: pattern(r"^\t+"),
                message: "YAML indentation must use spaces, not tabs",
            },
        },
        Rule {
            id: "quality.yaml.trailing-whitespace",
            category: AnalysisCategory::Quality,
            severity: Severity::Low,
            check: Check::LinePattern {
                pattern: pattern(r"\S[ \t]+$"),
                message: "Trailing whitespace",
            },
        },
        Rule {
            id: "quality.yaml.odd-indentation",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::File(check_odd_indentation),
        },
        // Quality: Ansible
        Rule {
            id: "quality.yaml.ansible-deprecated-syntax",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::File(check_ansible_deprecated),
        },
        Rule {
            id: "quality.yaml.ansible-unquoted-variable",
            category: AnalysisCategory::Quality,
            severity: Severity::Medium,
            check: Check::File(check_ansible_unquoted_vars),
        },
        // Security: Ansible
        Rule {
            id: "security.yaml.ansible-shell-injection",
            category: AnalysisCategory::Security,
            severity: Severity::High,
            check: Check::File(check_ansible_shell_injection),
        },
        Rule {
            id: "security.yaml.ansible-world-writable",
            category: AnalysisCategory::Security,
            severity: Severity::Medium,
            check: Check::File(check_ansible_world_writable),
        },
        Rule {
            id: "security.yaml.ansible-debug-sensitive",
            category: AnalysisCategory::Security,
            severity: Severity::Medium,
            check: Check::File(check_ansible_debug_sensitive),
        },
        // Performance: Ansible
        Rule {
            id: "performance.yaml.ansible-shell-module",
            category: AnalysisCategory::Performance,
            severity: Severity::Medium,
            check: Check::File(check_ansible_shell_module),
        },
        Rule {
            id: "performance.yaml.ansible-with-items",
            category: AnalysisCategory::Performance,
            severity: Severity::Medium,
            check: Check::File(check_ansible_with_items),
        },
    ]
}

fn check_odd_indentation(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() || !line.starts_with(' ') {
            continue;
        }
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent % 2 != 0 {
            issues.push(rule.issue_at(
                path,
                idx as u32 + 1,
                format!("Indentation of {indent} spaces; use multiples of two"),
            ));
        }
    }
    issues
}

/// Run a per-line pattern only on Ansible files.
fn ansible_line_check(
    rule: &Rule,
    content: &str,
    path: &Path,
    pattern: &Regex,
    message: impl Fn(&str) -> String,
) -> Vec<Issue> {
    if !is_ansible(content) {
        return Vec::new();
    }
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(idx, line)| rule.issue_at(path, idx as u32 + 1, message(line)))
        .collect()
}

fn check_ansible_deprecated(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    static DEPRECATED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    let table = DEPRECATED.get_or_init(|| {
        vec![
            (
                pattern(r"^\s*include:"),
                "include: is deprecated; use include_tasks or import_tasks",
            ),
            (pattern(r"^\s*sudo:"), "sudo: is deprecated; use become"),
            (
                pattern(r"^\s*sudo_user:"),
                "sudo_user: is deprecated; use become_user",
            ),
            (
                pattern(r"^\s*always_run:"),
                "always_run: is deprecated; use check_mode",
            ),
        ]
    });

    if !is_ansible(content) {
        return Vec::new();
    }
    let mut issues = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for (re, message) in table {
            if re.is_match(line) {
                issues.push(rule.issue_at(path, idx as u32 + 1, (*message).to_string()));
            }
        }
    }
    issues
}

fn check_ansible_unquoted_vars(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    static UNQUOTED: OnceLock<Regex> = OnceLock::new();
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    let unquoted = UNQUOTED.get_or_init(|| pattern(r":\s*\{\{.*\}\}"));
    let quoted = QUOTED.get_or_init(|| pattern(r#":\s*['"]\{\{.*\}\}['"]"#));

    if !is_ansible(content) {
        return Vec::new();
    }
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| unquoted.is_match(line) && !quoted.is_match(line))
        .map(|(idx, _)| {
            rule.issue_at(
                path,
                idx as u32 + 1,
                "Bare {{ }} value; quote template expressions to avoid YAML parsing surprises"
                    .to_string(),
            )
        })
        .collect()
}

fn check_ansible_shell_injection(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    static SHELL_TEMPLATE: OnceLock<Regex> = OnceLock::new();
    let re = SHELL_TEMPLATE.get_or_init(|| pattern(r"(shell|command):.*\{\{.*\}\}"));
    ansible_line_check(rule, content, path, re, |_| {
        "shell/command with template interpolation; user-controlled values allow injection. \
         Use the quote filter or a dedicated module"
            .to_string()
    })
}

fn check_ansible_world_writable(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    static MODE: OnceLock<Regex> = OnceLock::new();
    let re = MODE.get_or_init(|| pattern(r#"mode:\s*['"]?0?\d\d7['"]?"#));
    ansible_line_check(rule, content, path, re, |_| {
        "World-writable file mode; restrict permissions".to_string()
    })
}

fn check_ansible_debug_sensitive(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    static DEBUG: OnceLock<Regex> = OnceLock::new();
    let re =
        DEBUG.get_or_init(|| pattern(r"(?i)debug:.*(var|msg):.*(password|secret|key|token)"));
    ansible_line_check(rule, content, path, re, |_| {
        "Debug task may print sensitive values to logs".to_string()
    })
}

fn check_ansible_shell_module(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    static SHELL_CMD: OnceLock<Regex> = OnceLock::new();
    let re = SHELL_CMD.get_or_init(|| {
        pattern(r"(shell|command):\s*.*\b(apt|yum|pip|git clone|systemctl)\b")
    });
    ansible_line_check(rule, content, path, re, |_| {
        "shell/command wrapping a package or service operation; the dedicated module is \
         idempotent and faster on repeat runs"
            .to_string()
    })
}

fn check_ansible_with_items(rule: &Rule, content: &str, path: &Path) -> Vec<Issue> {
    static WITH_ITEMS: OnceLock<Regex> = OnceLock::new();
    let re = WITH_ITEMS.get_or_init(|| pattern(r"^\s*with_items:"));
    ansible_line_check(rule, content, path, re, |_| {
        "with_items is deprecated; use loop".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYBOOK: &str = "- hosts: web\n  become: yes\n  tasks:\n    - name: run a thing\n      shell: echo {{ user_input }}\n    - name: old loop\n      with_items:\n        - a\n";

    fn eval_rule(id: &str, content: &str) -> Vec<Issue> {
        rules()
            .iter()
            .find(|r| r.id == id)
            .expect("rule exists")
            .evaluate(content, Path::new("site.yml"))
    }

    #[test]
    fn test_ansible_heuristic() {
        assert!(is_ansible(PLAYBOOK));
        assert!(!is_ansible("version: 2\nservices:\n  db:\n    image: postgres\n"));
    }

    #[test]
    fn test_shell_injection_only_on_ansible_files() {
        let issues = eval_rule("security.yaml.ansible-shell-injection", PLAYBOOK);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, Some(5));

        // Same line in a non-Ansible file is ignored
        let compose = "services:\n  app:\n    shell: echo {{ x }}\n";
        assert!(eval_rule("security.yaml.ansible-shell-injection", compose).is_empty());
    }

    #[test]
    fn test_with_items_deprecated() {
        let issues = eval_rule("performance.yaml.ansible-with-items", PLAYBOOK);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_tabs_flagged() {
        let issues = eval_rule("quality.yaml.tabs", "key:\n\tvalue: 1\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, Some(2));
    }

    #[test]
    fn test_odd_indentation() {
        let issues = eval_rule("quality.yaml.odd-indentation", "a:\n   b: 1\n");
        assert_eq!(issues.len(), 1);
        assert!(eval_rule("quality.yaml.odd-indentation", "a:\n  b: 1\n").is_empty());
    }

    #[test]
    fn test_unquoted_variable() {
        let play = "- hosts: all\n  tasks:\n    - name: copy\n      vars:\n        dest: {{ target }}\n      when: true\n";
        let issues = eval_rule("quality.yaml.ansible-unquoted-variable", play);
        assert_eq!(issues.len(), 1);

        let quoted = play.replace("{{ target }}", "\"{{ target }}\"");
        assert!(eval_rule("quality.yaml.ansible-unquoted-variable", &quoted).is_empty());
    }
}
