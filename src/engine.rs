//! Analysis orchestration
//!
//! Enumerates a repository, dispatches per-file analyses across a bounded
//! worker pool, and folds the results into a single [`AnalysisReport`].
//!
//! Concurrency model: at most `concurrency_limit` file analyses are in
//! flight; each is independent and shares no mutable state with its
//! siblings beyond the tool-availability and result caches. The final
//! `file_results` order matches enumeration order regardless of
//! completion order. An overall deadline cancels outstanding work
//! cooperatively; unfinished files are reported as `timed-out` and the
//! run completes with partial results.

use chrono::Utc;
use crossbeam_channel::unbounded;
use rayon::ThreadPoolBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::FileAnalyzer;
use crate::cache::{NoopCache, ResultCache};
use crate::config::EngineConfig;
use crate::language;
use crate::models::{
    AnalysisCategory, AnalysisReport, AnalysisSummary, FileAnalysisResult, Issue, IssueCounts,
    SkipReason,
};
use crate::provider::{FileProvider, SourceTree};
use crate::scoring;
use crate::tools::ToolRegistry;

/// Run-level failures. Everything else is recovered as data within the
/// report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to enumerate repository files: {0}")]
    Enumeration(#[from] std::io::Error),
}

/// Composes the classifier, rule catalog, tool adapters, and score
/// aggregation into whole-repository analysis runs.
pub struct AnalysisOrchestrator {
    config: EngineConfig,
    tools: ToolRegistry,
    cache: Arc<dyn ResultCache>,
}

impl AnalysisOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            tools: ToolRegistry::default(),
            cache: Arc::new(NoopCache),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze a repository on disk.
    pub fn analyze_path(
        &self,
        root: &Path,
        categories: &[AnalysisCategory],
    ) -> Result<AnalysisReport, EngineError> {
        let provider = SourceTree::new(root, &self.config);
        self.analyze_repository(&provider, categories)
    }

    /// Analyze a repository through an injected content provider.
    pub fn analyze_repository(
        &self,
        provider: &dyn FileProvider,
        categories: &[AnalysisCategory],
    ) -> Result<AnalysisReport, EngineError> {
        let started = Instant::now();
        let files = provider.files()?;
        info!(
            "analyzing {} ({} files, categories: {})",
            provider.repository_ref(),
            files.len(),
            categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );

        let file_results = self.run_analyses(provider, &files, categories);
        let report = self.build_report(provider.repository_ref(), categories, file_results);

        info!(
            "analysis of {} finished in {:?} ({}/{} files analyzed)",
            report.repository_ref,
            started.elapsed(),
            report.summary.analyzed_files,
            report.summary.total_files
        );
        Ok(report)
    }

    /// Analyze a snippet that is not backed by a file.
    pub fn analyze_code(
        &self,
        content: &str,
        language_name: &str,
        virtual_path: &Path,
    ) -> Vec<Issue> {
        let analyzer = FileAnalyzer::new(&self.config, &self.tools, self.cache.as_ref());
        analyzer.analyze_code(content, language_name, virtual_path)
    }

    /// Dispatch per-file work across the bounded pool and merge results
    /// back into enumeration order.
    fn run_analyses(
        &self,
        provider: &dyn FileProvider,
        files: &[PathBuf],
        categories: &[AnalysisCategory],
    ) -> Vec<FileAnalysisResult> {
        let deadline = Instant::now() + self.config.analysis_timeout;
        let cancelled = AtomicBool::new(false);
        let pool_done = AtomicBool::new(false);
        let (tx, rx) = unbounded::<(usize, FileAnalysisResult)>();

        let pool = match ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency_limit)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                // Degenerate fallback: analyze sequentially on this thread.
                warn!("worker pool unavailable ({e}), analyzing sequentially");
                return self.run_sequential(provider, files, categories, deadline);
            }
        };

        let analyzer = FileAnalyzer::new(&self.config, &self.tools, self.cache.as_ref());

        std::thread::scope(|scope| {
            // Watchdog flips the cancellation flag at the deadline; workers
            // check it before starting a file and shrink tool budgets from
            // the time remaining, so in-flight child processes die with it.
            scope.spawn(|| {
                while !pool_done.load(Ordering::Relaxed) {
                    if Instant::now() >= deadline {
                        if !cancelled.swap(true, Ordering::Relaxed) {
                            warn!("analysis timeout reached, cancelling outstanding work");
                        }
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            });

            pool.scope(|pool_scope| {
                for (idx, path) in files.iter().enumerate() {
                    if idx >= self.config.max_files {
                        // Report overflow files without analyzing them.
                        let (lang, _) = language::classify(path);
                        let _ = tx.send((
                            idx,
                            FileAnalysisResult::skipped(path, lang, SkipReason::FileLimit),
                        ));
                        continue;
                    }

                    let tx = tx.clone();
                    let analyzer = &analyzer;
                    let cancelled = &cancelled;
                    pool_scope.spawn(move |_| {
                        if cancelled.load(Ordering::Relaxed) {
                            return;
                        }
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        let tool_budget = self.config.tool_timeout.min(remaining);
                        let result =
                            analyzer.analyze_file(provider, path, categories, tool_budget);
                        let _ = tx.send((idx, result));
                    });
                }
            });
            pool_done.store(true, Ordering::Relaxed);
        });
        drop(tx);

        let mut slots: Vec<Option<FileAnalysisResult>> = (0..files.len()).map(|_| None).collect();
        for (idx, result) in rx {
            slots[idx] = Some(result);
        }

        // Anything the deadline left unfinished is reported, not dropped.
        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    let path = &files[idx];
                    let (lang, _) = language::classify(path);
                    debug!("{} timed out before analysis", path.display());
                    FileAnalysisResult::skipped(path, lang, SkipReason::TimedOut)
                })
            })
            .collect()
    }

    fn run_sequential(
        &self,
        provider: &dyn FileProvider,
        files: &[PathBuf],
        categories: &[AnalysisCategory],
        deadline: Instant,
    ) -> Vec<FileAnalysisResult> {
        let analyzer = FileAnalyzer::new(&self.config, &self.tools, self.cache.as_ref());
        files
            .iter()
            .enumerate()
            .map(|(idx, path)| {
                let (lang, _) = language::classify(path);
                if idx >= self.config.max_files {
                    return FileAnalysisResult::skipped(path, lang, SkipReason::FileLimit);
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return FileAnalysisResult::skipped(path, lang, SkipReason::TimedOut);
                }
                analyzer.analyze_file(
                    provider,
                    path,
                    categories,
                    self.config.tool_timeout.min(remaining),
                )
            })
            .collect()
    }

    fn build_report(
        &self,
        repository_ref: String,
        categories: &[AnalysisCategory],
        file_results: Vec<FileAnalysisResult>,
    ) -> AnalysisReport {
        let analyzed_files = file_results.iter().filter(|r| r.analyzed).count();

        let mut languages_seen: BTreeMap<String, usize> = BTreeMap::new();
        for result in &file_results {
            *languages_seen
                .entry(result.language.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut scores = BTreeMap::new();
        for category in categories {
            let category_issues = file_results
                .iter()
                .flat_map(|r| r.issues.iter())
                .filter(|i| i.category == *category);
            scores.insert(
                *category,
                scoring::score(category_issues, analyzed_files, &self.config.weights),
            );
        }

        let summary = AnalysisSummary {
            total_files: file_results.len(),
            analyzed_files,
            skipped_files: file_results.len() - analyzed_files,
            languages_seen,
            issues: IssueCounts::from_issues(file_results.iter().flat_map(|r| r.issues.iter())),
        };

        let top_issues = AnalysisReport::rank_issues(&file_results, self.config.top_issues_cap);

        AnalysisReport {
            repository_ref,
            requested_categories: categories.to_vec(),
            scores,
            summary,
            top_issues,
            file_results,
            timestamp: Utc::now(),
        }
    }
}
