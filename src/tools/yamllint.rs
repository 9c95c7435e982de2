//! Yamllint adapter
//!
//! YAML quality linting via yamllint's parsable output format:
//! `file.yml:3:1: [error] too many blank lines (2 > 0) (empty-lines)`

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::{ExternalTool, RawToolOutput};
use crate::language::Language;
use crate::models::{AnalysisCategory, Issue, Severity};

pub struct Yamllint;

impl Yamllint {
    pub fn new() -> Self {
        Self
    }

    fn map_level(level: &str) -> Severity {
        match level {
            "error" => Severity::High,
            "warning" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

impl Default for Yamllint {
    fn default() -> Self {
        Self::new()
    }
}

fn line_format() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^(?P<file>[^:]+):(?P<line>\d+):\d+:\s*\[(?P<level>\w+)\]\s*(?P<msg>.*?)(?:\s*\((?P<rule>[\w-]+)\))?$")
            .expect("static yamllint pattern must compile")
    })
}

impl ExternalTool for Yamllint {
    fn name(&self) -> &'static str {
        "yamllint"
    }

    fn language(&self) -> Language {
        Language::Yaml
    }

    fn category(&self) -> AnalysisCategory {
        AnalysisCategory::Quality
    }

    fn command(&self, file: &Path) -> Vec<String> {
        vec![
            "yamllint".to_string(),
            "-f".to_string(),
            "parsable".to_string(),
            file.display().to_string(),
        ]
    }

    fn parse_output(&self, output: &RawToolOutput, file: &Path) -> Vec<Issue> {
        output
            .stdout
            .lines()
            .filter_map(|line| {
                let caps = line_format().captures(line.trim())?;
                let line_no: u32 = caps.name("line")?.as_str().parse().ok()?;
                let level = caps.name("level").map(|m| m.as_str()).unwrap_or("warning");
                let message = caps.name("msg").map(|m| m.as_str()).unwrap_or("YAML lint issue");
                let rule = caps.name("rule").map(|m| m.as_str()).unwrap_or("unknown");

                Some(Issue::from_tool(
                    "yamllint",
                    format!("yamllint.{rule}"),
                    file,
                    Some(line_no),
                    AnalysisCategory::Quality,
                    Self::map_level(level),
                    message,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parsable_line() {
        let output = RawToolOutput {
            stdout: "site.yml:3:1: [error] too many blank lines (2 > 0) (empty-lines)\n\
                     site.yml:9:12: [warning] truthy value should be one of [false, true] (truthy)\n"
                .to_string(),
            stderr: String::new(),
            exit_code: 1,
        };

        let issues = Yamllint::new().parse_output(&output, Path::new("site.yml"));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].rule_id, "yamllint.empty-lines");
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].line, Some(3));
        assert_eq!(issues[1].rule_id, "yamllint.truthy");
        assert_eq!(issues[1].severity, Severity::Medium);
    }

    #[test]
    fn test_empty_output() {
        let output = RawToolOutput::default();
        assert!(Yamllint::new().parse_output(&output, Path::new("a.yml")).is_empty());
    }
}
