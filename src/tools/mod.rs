//! External tool adapters
//!
//! Optional linters and scanners invoked as child processes to augment the
//! internal rule catalog. Every adapter follows the same contract: check
//! availability (cached for the registry's lifetime), run with a hard
//! wall-clock timeout, parse output into [`Issue`] records. Absence,
//! timeout, or failure of a tool never aborts the surrounding analysis;
//! the engine falls back to internal rules and records the outcome.

mod ansible_lint;
mod bandit;
mod yamllint;

pub use ansible_lint::AnsibleLint;
pub use bandit::Bandit;
pub use yamllint::Yamllint;

use dashmap::DashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::language::Language;
use crate::models::{AnalysisCategory, Issue};

/// How an external tool invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    Ok,
    NotInstalled,
    TimedOut,
    NonzeroExit(i32),
}

/// Raw process output handed to an adapter's parser.
#[derive(Debug, Clone, Default)]
pub struct RawToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// One external linter/scanner, keyed by the `(language, category)` pair
/// it augments. Adapters are data in a registry; the file analyzer never
/// needs to know which specific tool it is calling.
pub trait ExternalTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn language(&self) -> Language;
    fn category(&self) -> AnalysisCategory;
    /// Whether this tool should run on the given file content. Lets an
    /// adapter restrict itself to a dialect (ansible-lint only touches
    /// playbooks, not arbitrary YAML).
    fn applies(&self, _content: &str) -> bool {
        true
    }
    /// Command line to analyze one file.
    fn command(&self, file: &Path) -> Vec<String>;
    /// Turn raw output into issues. A nonzero exit often just means
    /// "findings present"; the adapter decides what is parseable.
    fn parse_output(&self, output: &RawToolOutput, file: &Path) -> Vec<Issue>;
}

/// Registry of configured adapters plus the per-run availability cache.
///
/// The availability cache is the only shared mutable state touched from
/// concurrent file analyses: read-many, write-once per tool per run.
pub struct ToolRegistry {
    tools: Vec<Box<dyn ExternalTool>>,
    availability: DashMap<&'static str, bool>,
}

impl Default for ToolRegistry {
    /// The standard adapter set: bandit for Python security, yamllint for
    /// YAML quality, ansible-lint for playbook security.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(Bandit::new()));
        registry.register(Box::new(Yamllint::new()));
        registry.register(Box::new(AnsibleLint::new()));
        registry
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            availability: DashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Box<dyn ExternalTool>) {
        debug!("registered external tool: {}", tool.name());
        self.tools.push(tool);
    }

    /// Adapters registered for a `(language, category)` pair.
    pub fn tools_for(
        &self,
        language: Language,
        category: AnalysisCategory,
    ) -> impl Iterator<Item = &dyn ExternalTool> {
        self.tools
            .iter()
            .filter(move |t| t.language() == language && t.category() == category)
            .map(|t| t.as_ref())
    }

    /// Whether the tool's executable exists, cached for this registry's
    /// lifetime.
    pub fn is_available(&self, tool: &dyn ExternalTool) -> bool {
        *self
            .availability
            .entry(tool.name())
            .or_insert_with(|| executable_available(tool.name()))
    }

    /// Run one adapter against one file.
    ///
    /// `invoke_path` is the on-disk path handed to the child process;
    /// `report_path` is the repository-relative path stamped on issues.
    /// Never errors: every failure mode maps to an outcome with an empty
    /// issue list.
    pub fn run(
        &self,
        tool: &dyn ExternalTool,
        invoke_path: &Path,
        report_path: &Path,
        timeout: Duration,
    ) -> (Vec<Issue>, ToolOutcome) {
        if !self.is_available(tool) {
            debug!("{} not installed, using internal rules only", tool.name());
            return (Vec::new(), ToolOutcome::NotInstalled);
        }

        let cmd = tool.command(invoke_path);
        match run_process(&cmd, timeout) {
            ProcessResult::Completed(output) => {
                let issues = tool.parse_output(&output, report_path);
                let outcome = if output.exit_code == 0 || !issues.is_empty() {
                    ToolOutcome::Ok
                } else {
                    ToolOutcome::NonzeroExit(output.exit_code)
                };
                (issues, outcome)
            }
            ProcessResult::TimedOut => {
                warn!(
                    "{} timed out after {:?} on {}",
                    tool.name(),
                    timeout,
                    report_path.display()
                );
                (Vec::new(), ToolOutcome::TimedOut)
            }
            ProcessResult::SpawnFailed => {
                // Executable disappeared between the availability check and
                // the spawn; treat as not installed from here on.
                self.availability.insert(tool.name(), false);
                (Vec::new(), ToolOutcome::NotInstalled)
            }
        }
    }
}

/// Check if an executable answers `--version`.
fn executable_available(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

enum ProcessResult {
    Completed(RawToolOutput),
    TimedOut,
    SpawnFailed,
}

/// Drain a pipe to a string on a background thread. The child's pipe
/// buffer is finite; without a concurrent reader a chatty tool blocks on
/// write and never exits, which would be misreported as a timeout.
fn spawn_pipe_reader<R>(mut pipe: R) -> std::thread::JoinHandle<String>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn join_pipe_reader(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Spawn a child process and wait for it, polling against a wall-clock
/// deadline while reader threads drain stdout/stderr. On expiry the
/// child is killed, not abandoned.
fn run_process(cmd: &[String], timeout: Duration) -> ProcessResult {
    let Some((program, args)) = cmd.split_first() else {
        return ProcessResult::SpawnFailed;
    };

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            debug!("failed to spawn {program}: {e}");
            return ProcessResult::SpawnFailed;
        }
    };

    let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
    let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return ProcessResult::Completed(RawToolOutput {
                    stdout: join_pipe_reader(stdout_reader),
                    stderr: join_pipe_reader(stderr_reader),
                    exit_code: status.code().unwrap_or(-1),
                });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Readers see EOF once the child is dead.
                    join_pipe_reader(stdout_reader);
                    join_pipe_reader(stderr_reader);
                    return ProcessResult::TimedOut;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                debug!("failed to wait for {program}: {e}");
                let _ = child.kill();
                return ProcessResult::SpawnFailed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    struct FakeTool;

    impl ExternalTool for FakeTool {
        fn name(&self) -> &'static str {
            "definitely-not-a-real-binary-name"
        }
        fn language(&self) -> Language {
            Language::Python
        }
        fn category(&self) -> AnalysisCategory {
            AnalysisCategory::Security
        }
        fn command(&self, file: &Path) -> Vec<String> {
            vec![self.name().to_string(), file.display().to_string()]
        }
        fn parse_output(&self, _output: &RawToolOutput, file: &Path) -> Vec<Issue> {
            vec![Issue::from_tool(
                self.name(),
                "fake.rule",
                file,
                Some(1),
                self.category(),
                Severity::High,
                "fake",
            )]
        }
    }

    #[test]
    fn test_missing_tool_yields_not_installed_and_no_issues() {
        let mut registry = ToolRegistry::empty();
        registry.register(Box::new(FakeTool));
        let tool = registry
            .tools_for(Language::Python, AnalysisCategory::Security)
            .next()
            .expect("registered");

        let (issues, outcome) =
            registry.run(tool, Path::new("x.py"), Path::new("x.py"), Duration::from_secs(1));
        assert!(issues.is_empty());
        assert_eq!(outcome, ToolOutcome::NotInstalled);
    }

    #[test]
    fn test_availability_is_cached() {
        let mut registry = ToolRegistry::empty();
        registry.register(Box::new(FakeTool));
        let tool = registry
            .tools_for(Language::Python, AnalysisCategory::Security)
            .next()
            .expect("registered");

        assert!(!registry.is_available(tool));
        // Second lookup hits the cache; same answer either way.
        assert!(!registry.is_available(tool));
        assert_eq!(registry.availability.len(), 1);
    }

    #[test]
    fn test_tools_for_filters_by_language_and_category() {
        let registry = ToolRegistry::default();
        assert_eq!(
            registry
                .tools_for(Language::Python, AnalysisCategory::Security)
                .count(),
            1
        );
        assert_eq!(
            registry
                .tools_for(Language::Python, AnalysisCategory::Performance)
                .count(),
            0
        );
        assert_eq!(
            registry
                .tools_for(Language::Yaml, AnalysisCategory::Quality)
                .count(),
            1
        );
        assert_eq!(
            registry
                .tools_for(Language::Yaml, AnalysisCategory::Security)
                .count(),
            1
        );
    }

    #[test]
    fn test_run_process_timeout_kills_child() {
        let cmd = vec!["sleep".to_string(), "5".to_string()];
        let start = Instant::now();
        let result = run_process(&cmd, Duration::from_millis(200));
        assert!(matches!(result, ProcessResult::TimedOut));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_process_drains_output_larger_than_pipe_buffer() {
        // A child writing well past the OS pipe buffer must not block on
        // a full pipe; it completes promptly with all output captured.
        let cmd = vec![
            "sh".to_string(),
            "-c".to_string(),
            "head -c 200000 /dev/zero | tr '\\0' 'a'".to_string(),
        ];
        let start = Instant::now();
        match run_process(&cmd, Duration::from_secs(5)) {
            ProcessResult::Completed(out) => {
                assert_eq!(out.exit_code, 0);
                assert_eq!(out.stdout.len(), 200_000);
                assert!(start.elapsed() < Duration::from_secs(4));
            }
            _ => panic!("large-output child should complete"),
        }
    }

    #[test]
    fn test_run_process_captures_stdout() {
        let cmd = vec!["echo".to_string(), "hello".to_string()];
        match run_process(&cmd, Duration::from_secs(5)) {
            ProcessResult::Completed(out) => {
                assert_eq!(out.exit_code, 0);
                assert_eq!(out.stdout.trim(), "hello");
            }
            _ => panic!("echo should complete"),
        }
    }
}
