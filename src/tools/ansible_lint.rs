//! Ansible-lint adapter
//!
//! Playbook scanning via [ansible-lint](https://ansible-lint.readthedocs.io/),
//! which emits a JSON array of `{tag, level, message, linenumber}` records.
//! Only runs on files that look like Ansible playbooks; plain YAML is
//! covered by yamllint.

use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

use super::{ExternalTool, RawToolOutput};
use crate::language::Language;
use crate::models::{AnalysisCategory, Issue, Severity};
use crate::rules::is_ansible;

pub struct AnsibleLint;

impl AnsibleLint {
    pub fn new() -> Self {
        Self
    }

    fn map_level(level: &str) -> Severity {
        match level.to_lowercase().as_str() {
            "very_high" | "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }

    fn issue_from_record(record: &JsonValue, file: &Path) -> Option<Issue> {
        let tag = record.get("tag").and_then(|t| t.as_str()).unwrap_or("unknown");
        let line = record
            .get("linenumber")
            .and_then(|l| l.as_u64())
            .map(|l| l as u32);
        let message = record
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Ansible lint issue");
        let severity = Self::map_level(
            record.get("level").and_then(|l| l.as_str()).unwrap_or("warning"),
        );

        Some(Issue::from_tool(
            "ansible-lint",
            format!("ansible-lint.{tag}"),
            file,
            line,
            AnalysisCategory::Security,
            severity,
            message,
        ))
    }
}

impl Default for AnsibleLint {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalTool for AnsibleLint {
    fn name(&self) -> &'static str {
        "ansible-lint"
    }

    fn language(&self) -> Language {
        Language::Yaml
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::Security
    }

    fn applies(&self, content: &str) -> bool {
        is_ansible(content)
    }

    fn command(&self, file: &Path) -> Vec<String> {
        vec![
            "ansible-lint".to_string(),
            "-f".to_string(),
            "json".to_string(),
            file.display().to_string(),
        ]
    }

    fn parse_output(&self, output: &RawToolOutput, file: &Path) -> Vec<Issue> {
        let Ok(json) = serde_json::from_str::<JsonValue>(&output.stdout) else {
            if !output.stdout.is_empty() {
                debug!("unparseable ansible-lint output for {}", file.display());
            }
            return Vec::new();
        };

        json.as_array()
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| Self::issue_from_record(r, file))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueSource;

    #[test]
    fn test_level_mapping() {
        assert_eq!(AnsibleLint::map_level("very_high"), Severity::High);
        assert_eq!(AnsibleLint::map_level("medium"), Severity::Medium);
        assert_eq!(AnsibleLint::map_level("info"), Severity::Low);
    }

    #[test]
    fn test_parse_records() {
        let stdout = r#"[
            {
                "tag": "risky-shell-pipe",
                "level": "high",
                "message": "Shells that use pipes should set the pipefail option",
                "linenumber": 12
            }
        ]"#;
        let output = RawToolOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 2,
        };

        let issues = AnsibleLint::new().parse_output(&output, Path::new("site.yml"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id, "ansible-lint.risky-shell-pipe");
        assert_eq!(issues[0].line, Some(12));
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(
            issues[0].source,
            IssueSource::ExternalTool("ansible-lint".into())
        );
    }

    #[test]
    fn test_applies_only_to_playbooks() {
        let tool = AnsibleLint::new();
        assert!(tool.applies("- hosts: web\n  become: yes\n  tasks:\n    - ping:\n"));
        assert!(!tool.applies("version: 2\nservices:\n  db:\n    image: postgres\n"));
    }

    #[test]
    fn test_garbage_output_yields_nothing() {
        let output = RawToolOutput {
            stdout: "WARNING: listed files".to_string(),
            stderr: String::new(),
            exit_code: 2,
        };
        assert!(AnsibleLint::new()
            .parse_output(&output, Path::new("site.yml"))
            .is_empty());
    }
}
