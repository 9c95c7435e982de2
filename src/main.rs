//! Repolens - rule-based code analysis CLI
//!
//! Analyzes a repository for security, quality, and performance issues
//! and reports per-category scores.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repolens::models::AnalysisCategory;
use repolens::{AnalysisOrchestrator, AnalysisReport, EngineConfig};

/// Repolens - rule-based code health analysis
///
/// Scores a repository 0-100 for security, quality, and performance
/// using an internal rule catalog plus external linters when installed.
#[derive(Parser, Debug)]
#[command(name = "repolens", version, about)]
struct Cli {
    /// Path to repository (default: current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Analysis type: security, quality, performance, or full
    #[arg(long, short = 't', default_value = "full")]
    analysis_type: String,

    /// Output format: text or json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Number of parallel workers
    #[arg(long, default_value = "8")]
    workers: usize,

    /// Skip files larger than this many bytes
    #[arg(long, default_value = "1048576")]
    max_file_size: u64,

    /// Per-tool timeout in seconds
    #[arg(long, default_value = "30")]
    tool_timeout: u64,

    /// Overall analysis deadline in seconds
    #[arg(long, default_value = "300")]
    timeout: u64,

    /// Disable external tools, use internal rules only
    #[arg(long)]
    no_tools: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let Some(categories) = AnalysisCategory::parse_request(&cli.analysis_type) else {
        bail!(
            "unknown analysis type '{}' (expected security, quality, performance, or full)",
            cli.analysis_type
        );
    };

    let mut config = EngineConfig::new()
        .with_concurrency_limit(cli.workers)
        .with_max_file_size(cli.max_file_size)
        .with_tool_timeout(Duration::from_secs(cli.tool_timeout))
        .with_analysis_timeout(Duration::from_secs(cli.timeout));
    if cli.no_tools {
        config = config.without_external_tools();
    }

    let orchestrator = AnalysisOrchestrator::new(config);
    let report = orchestrator.analyze_path(&cli.path, &categories)?;

    match cli.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &AnalysisReport) {
    println!("Repository: {}", report.repository_ref);
    println!(
        "Files: {} total, {} analyzed, {} skipped",
        report.summary.total_files, report.summary.analyzed_files, report.summary.skipped_files
    );

    println!("\nScores:");
    for (category, score) in &report.scores {
        println!("  {category:<12} {score}/100");
    }

    let counts = &report.summary.issues;
    println!(
        "\nIssues: {} total ({} critical, {} high, {} medium, {} low)",
        counts.total, counts.critical, counts.high, counts.medium, counts.low
    );

    if !report.top_issues.is_empty() {
        println!("\nTop issues:");
        for issue in &report.top_issues {
            let line = issue.line.map(|l| l.to_string()).unwrap_or_default();
            println!(
                "  [{}] {}:{} {} ({})",
                issue.severity,
                issue.file_path.display(),
                line,
                issue.message,
                issue.rule_id
            );
        }
    }
}
