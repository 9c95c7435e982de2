//! Bandit adapter
//!
//! Python security scanning via [bandit](https://bandit.readthedocs.io/).
//! Bandit prints JSON on stdout and exits nonzero when it has findings,
//! so the parser reads stdout regardless of exit code.

use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

use super::{ExternalTool, RawToolOutput};
use crate::language::Language;
use crate::models::{AnalysisCategory, Issue, Severity};

pub struct Bandit;

impl Bandit {
    pub fn new() -> Self {
        Self
    }

    /// Map bandit's severity/confidence pair onto ours. Low-confidence
    /// findings are downgraded one step.
    fn map_severity(issue_severity: &str, issue_confidence: &str) -> Severity {
        let base = match issue_severity.to_uppercase().as_str() {
            "HIGH" => Severity::Critical,
            "MEDIUM" => Severity::High,
            _ => Severity::Medium,
        };

        if issue_confidence.to_uppercase() == "LOW" {
            match base {
                Severity::Critical => Severity::High,
                Severity::High => Severity::Medium,
                other => other,
            }
        } else {
            base
        }
    }

    /// Bandit checks that overlap the internal catalog map onto the
    /// internal rule ids, so the analyzer's `(line, rule_id)` dedup
    /// collapses a location both sources flag into one finding.
    fn rule_id_for(test_id: &str) -> String {
        match test_id {
            "B102" => "security.python.exec".to_string(),
            "B301" | "B403" => "security.python.pickle-load".to_string(),
            "B307" => "security.python.eval".to_string(),
            "B506" => "security.python.yaml-load".to_string(),
            "B602" | "B604" => "security.python.subprocess-shell".to_string(),
            "B605" => "security.python.os-system".to_string(),
            other => format!("bandit.{other}"),
        }
    }

    fn issue_from_result(result: &JsonValue, file: &Path) -> Option<Issue> {
        let test_id = result.get("test_id")?.as_str()?;
        let line = result.get("line_number").and_then(|l| l.as_u64()).map(|l| l as u32);
        let message = result
            .get("issue_text")
            .and_then(|t| t.as_str())
            .unwrap_or("Security issue");
        let severity = Self::map_severity(
            result
                .get("issue_severity")
                .and_then(|s| s.as_str())
                .unwrap_or("MEDIUM"),
            result
                .get("issue_confidence")
                .and_then(|c| c.as_str())
                .unwrap_or("MEDIUM"),
        );

        Some(Issue::from_tool(
            "bandit",
            Self::rule_id_for(test_id),
            file,
            line,
            AnalysisCategory::Security,
            severity,
            message,
        ))
    }
}

impl Default for Bandit {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalTool for Bandit {
    fn name(&self) -> &'static str {
        "bandit"
    }

    fn language(&self) -> Language {
        Language::Python
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::Security
    }

    fn command(&self, file: &Path) -> Vec<String> {
        vec![
            "bandit".to_string(),
            "-f".to_string(),
            "json".to_string(),
            "-q".to_string(),
            file.display().to_string(),
        ]
    }

    fn parse_output(&self, output: &RawToolOutput, file: &Path) -> Vec<Issue> {
        let Ok(json) = serde_json::from_str::<JsonValue>(&output.stdout) else {
            if !output.stdout.is_empty() {
                debug!("unparseable bandit output for {}", file.display());
            }
            return Vec::new();
        };

        json.get("results")
            .and_then(|r| r.as_array())
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| Self::issue_from_result(r, file))
                    .collect()
            })
            .unwrap_or_default()
    }
}
