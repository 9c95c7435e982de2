//! Core data models for Repolens
//!
//! These models are used throughout the codebase for representing
//! issues, per-file results, and whole-repository analysis reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::language::Language;

/// Generate a deterministic issue ID based on content hash.
///
/// Issues with stable IDs can be tracked across runs and reliably
/// deduplicated. The ID is a 16-character hex string derived from hashing
/// the rule that fired, the location, and the message.
pub fn deterministic_issue_id(rule_id: &str, file: &str, line: u32, message: &str) -> String {
    let input = format!("{rule_id}\n{file}\n{line}\n{message}");
    let digest = Sha256::digest(input.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

/// Severity levels for issues
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Analysis categories. A request selects one or all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisCategory {
    Security,
    Quality,
    Performance,
}

impl AnalysisCategory {
    /// All three categories, the `full` request.
    pub const ALL: [AnalysisCategory; 3] = [
        AnalysisCategory::Security,
        AnalysisCategory::Quality,
        AnalysisCategory::Performance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisCategory::Security => "security",
            AnalysisCategory::Quality => "quality",
            AnalysisCategory::Performance => "performance",
        }
    }

    /// Parse a requested analysis type. `full` selects all categories.
    pub fn parse_request(s: &str) -> Option<Vec<AnalysisCategory>> {
        match s.to_ascii_lowercase().as_str() {
            "security" => Some(vec![AnalysisCategory::Security]),
            "quality" => Some(vec![AnalysisCategory::Quality]),
            "performance" => Some(vec![AnalysisCategory::Performance]),
            "full" => Some(Self::ALL.to_vec()),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an issue came from: the internal rule catalog or an external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "tool")]
pub enum IssueSource {
    Internal,
    ExternalTool(String),
}

impl std::fmt::Display for IssueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueSource::Internal => write!(f, "internal"),
            IssueSource::ExternalTool(name) => write!(f, "external-tool:{name}"),
        }
    }
}

/// One discrete finding produced by a rule or external tool.
///
/// Immutable once created; owned by the file analysis that produced it
/// until merged into a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub file_path: PathBuf,
    pub line: Option<u32>,
    pub category: AnalysisCategory,
    pub severity: Severity,
    pub message: String,
    pub rule_id: String,
    pub source: IssueSource,
}

impl Issue {
    /// Build an internal-rule issue with a deterministic ID.
    pub fn internal(
        rule_id: impl Into<String>,
        file_path: impl Into<PathBuf>,
        line: Option<u32>,
        category: AnalysisCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let rule_id = rule_id.into();
        let file_path = file_path.into();
        let message = message.into();
        let id = deterministic_issue_id(
            &rule_id,
            &file_path.to_string_lossy(),
            line.unwrap_or(0),
            &message,
        );
        Self {
            id,
            file_path,
            line,
            category,
            severity,
            message,
            rule_id,
            source: IssueSource::Internal,
        }
    }

    /// Build an issue reported by an external tool.
    pub fn from_tool(
        tool: impl Into<String>,
        rule_id: impl Into<String>,
        file_path: impl Into<PathBuf>,
        line: Option<u32>,
        category: AnalysisCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let mut issue = Self::internal(rule_id, file_path, line, category, severity, message);
        issue.source = IssueSource::ExternalTool(tool.into());
        issue
    }
}

/// Why a file was not analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    TooLarge,
    Unreadable,
    TimedOut,
    FileLimit,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooLarge => write!(f, "too-large"),
            SkipReason::Unreadable => write!(f, "unreadable"),
            SkipReason::TimedOut => write!(f, "timed-out"),
            SkipReason::FileLimit => write!(f, "file-limit"),
        }
    }
}

/// Result of analyzing one file. One per file per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysisResult {
    pub file_path: PathBuf,
    pub language: Language,
    pub issues: Vec<Issue>,
    pub analyzed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

impl FileAnalysisResult {
    /// A file that was analyzed, with whatever issues were found.
    pub fn analyzed(file_path: impl Into<PathBuf>, language: Language, issues: Vec<Issue>) -> Self {
        Self {
            file_path: file_path.into(),
            language,
            issues,
            analyzed: true,
            skip_reason: None,
        }
    }

    /// A file that was skipped. Skipped files carry no issues.
    pub fn skipped(file_path: impl Into<PathBuf>, language: Language, reason: SkipReason) -> Self {
        Self {
            file_path: file_path.into(),
            language,
            issues: Vec::new(),
            analyzed: false,
            skip_reason: Some(reason),
        }
    }
}

/// Issue counts broken down by severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl IssueCounts {
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
            counts.total += 1;
        }
        counts
    }
}

/// Aggregate counts for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub analyzed_files: usize,
    pub skipped_files: usize,
    /// Language tag -> number of files seen with that tag.
    pub languages_seen: BTreeMap<String, usize>,
    pub issues: IssueCounts,
}

/// The complete, immutable output of one repository analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub repository_ref: String,
    pub requested_categories: Vec<AnalysisCategory>,
    /// Category -> score in [0, 100].
    pub scores: BTreeMap<AnalysisCategory, u8>,
    pub summary: AnalysisSummary,
    /// Flattened, severity-sorted, capped issue list for display.
    pub top_issues: Vec<Issue>,
    pub file_results: Vec<FileAnalysisResult>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisReport {
    /// Flatten, sort by severity (highest first, then path/line), and cap.
    pub fn rank_issues(file_results: &[FileAnalysisResult], cap: usize) -> Vec<Issue> {
        let mut all: Vec<Issue> = file_results
            .iter()
            .flat_map(|r| r.issues.iter().cloned())
            .collect();
        all.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.file_path.cmp(&b.file_path))
                .then_with(|| a.line.cmp(&b.line))
        });
        all.truncate(cap);
        all
    }
}
