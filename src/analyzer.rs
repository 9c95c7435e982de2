//! Per-file analysis
//!
//! Runs the rule catalog (and, for full-tier languages, external tools)
//! against one file for the requested categories. Skips and unreadable
//! content are data on the result, never errors.

use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheKey, ResultCache};
use crate::config::EngineConfig;
use crate::language::{self, Language, SupportTier};
use crate::models::{AnalysisCategory, FileAnalysisResult, Issue, SkipReason};
use crate::provider::FileProvider;
use crate::rules;
use crate::tools::ToolRegistry;

pub struct FileAnalyzer<'a> {
    config: &'a EngineConfig,
    tools: &'a ToolRegistry,
    cache: &'a dyn ResultCache,
}

impl<'a> FileAnalyzer<'a> {
    pub fn new(
        config: &'a EngineConfig,
        tools: &'a ToolRegistry,
        cache: &'a dyn ResultCache,
    ) -> Self {
        Self {
            config,
            tools,
            cache,
        }
    }

    /// Analyze one file from the provider.
    ///
    /// `tool_budget` caps external tool invocations; the orchestrator
    /// shrinks it as the overall deadline approaches.
    pub fn analyze_file(
        &self,
        provider: &dyn FileProvider,
        path: &Path,
        categories: &[AnalysisCategory],
        tool_budget: Duration,
    ) -> FileAnalysisResult {
        let (lang, tier) = language::classify(path);

        if let Some(size) = provider.file_size(path) {
            if size > self.config.max_file_size {
                debug!("skipping oversized file {} ({size} bytes)", path.display());
                return FileAnalysisResult::skipped(path, lang, SkipReason::TooLarge);
            }
        }

        let Some(content) = provider.content(path) else {
            debug!("skipping unreadable file {}", path.display());
            return FileAnalysisResult::skipped(path, lang, SkipReason::Unreadable);
        };

        let key = CacheKey::new(&content, categories);
        if let Some(cached) = self.cache.get(&key) {
            // Content-hash collisions across different paths are treated
            // as misses; a hit must describe this exact file.
            if cached.file_path == path {
                return cached;
            }
        }

        let mut issues = self.evaluate_rules(&content, path, lang, categories);

        if tier == SupportTier::Full && self.config.external_tools {
            if let Some(abs) = provider.absolute(path) {
                for category in categories {
                    for tool in self.tools.tools_for(lang, *category) {
                        if !tool.applies(&content) {
                            continue;
                        }
                        let (tool_issues, outcome) =
                            self.tools.run(tool, &abs, path, tool_budget);
                        debug!(
                            "tool {} on {}: {outcome:?}, {} issues",
                            tool.name(),
                            path.display(),
                            tool_issues.len()
                        );
                        merge_tool_issues(&mut issues, tool_issues);
                    }
                }
            }
        }

        let result = FileAnalysisResult::analyzed(path, lang, issues);
        self.cache.put(key, result.clone());
        result
    }

    /// Analyze code not backed by a file, e.g. an ad hoc snippet.
    ///
    /// Internal rules only: external tools need a real path, and unsaved
    /// buffers do not have one.
    pub fn analyze_code(
        &self,
        content: &str,
        language_name: &str,
        virtual_path: &Path,
    ) -> Vec<Issue> {
        let (lang, _tier) = language::classify_name(language_name);
        self.evaluate_rules(content, virtual_path, lang, &AnalysisCategory::ALL)
    }

    fn evaluate_rules(
        &self,
        content: &str,
        path: &Path,
        lang: Language,
        categories: &[AnalysisCategory],
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        for category in categories {
            for rule in rules::rules_for(lang, *category) {
                issues.extend(rule.evaluate(content, path));
            }
        }
        issues
    }
}

/// Merge tool issues into the internal list, de-duplicating on
/// `(line, rule_id)`. The external result wins on conflict, since tool
/// output is typically more precise than a pattern match.
fn merge_tool_issues(issues: &mut Vec<Issue>, tool_issues: Vec<Issue>) {
    for tool_issue in tool_issues {
        if let Some(existing) = issues
            .iter_mut()
            .find(|i| i.line == tool_issue.line && i.rule_id == tool_issue.rule_id)
        {
            *existing = tool_issue;
        } else {
            issues.push(tool_issue);
        }
    }
}
