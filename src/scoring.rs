//! Score aggregation
//!
//! Reduces a category's issue list to a 0-100 score:
//!
//! ```text
//! score = clamp(100 - sum(penalty) / max(1, analyzed_files), 0, 100)
//! ```
//!
//! Penalties are severity-weighted (see [`ScoreWeights`]) and normalized
//! by analyzed file count so large codebases are not punished by raw
//! issue volume. Zero issues and zero analyzed files both score 100.

use crate::config::ScoreWeights;
use crate::models::Issue;

/// Score one category's issues against the number of analyzed files.
pub fn score<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    analyzed_files: usize,
    weights: &ScoreWeights,
) -> u8 {
    let total_penalty: u64 = issues
        .into_iter()
        .map(|i| weights.penalty(i.severity) as u64)
        .sum();

    // Vacuously clean: nothing found, or nothing analyzed.
    if total_penalty == 0 {
        return 100;
    }

    let normalization = analyzed_files.max(1) as f64;
    let raw = 100.0 - (total_penalty as f64 / normalization);
    raw.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisCategory, Severity};

    fn issue(severity: Severity) -> Issue {
        Issue::internal(
            "test.rule",
            "f.py",
            Some(1),
            AnalysisCategory::Security,
            severity,
            "m",
        )
    }

    #[test]
    fn test_empty_issue_set_scores_100() {
        let weights = ScoreWeights::default();
        assert_eq!(score([], 10, &weights), 100);
        assert_eq!(score([], 0, &weights), 100);
    }

    #[test]
    fn test_zero_analyzed_files_scores_100() {
        // Explicit edge case: no division artifact.
        assert_eq!(score([], 0, &ScoreWeights::default()), 100);
    }

    #[test]
    fn test_single_issue_penalties() {
        let weights = ScoreWeights::default();
        let critical = issue(Severity::Critical);
        let low = issue(Severity::Low);
        assert_eq!(score([&critical], 1, &weights), 75);
        assert_eq!(score([&low], 1, &weights), 99);
    }

    #[test]
    fn test_normalization_by_file_count() {
        let weights = ScoreWeights::default();
        let issues: Vec<Issue> = (0..10).map(|_| issue(Severity::High)).collect();
        // 100 penalty over 1 file -> 0; over 50 files -> 98
        assert_eq!(score(issues.iter(), 1, &weights), 0);
        assert_eq!(score(issues.iter(), 50, &weights), 98);
    }

    #[test]
    fn test_score_never_leaves_bounds() {
        let weights = ScoreWeights::default();
        let issues: Vec<Issue> = (0..1000).map(|_| issue(Severity::Critical)).collect();
        let s = score(issues.iter(), 1, &weights);
        assert_eq!(s, 0);
    }

    #[test]
    fn test_custom_weights() {
        let weights = ScoreWeights {
            critical: 50,
            high: 20,
            medium: 5,
            low: 0,
        };
        let low = issue(Severity::Low);
        let critical = issue(Severity::Critical);
        assert_eq!(score([&low], 1, &weights), 100);
        assert_eq!(score([&critical], 1, &weights), 50);
    }
}
