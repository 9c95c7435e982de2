//! Repolens - rule-based static code analysis
//!
//! Analyzes a repository across three categories (security, quality,
//! performance), combining an internal rule catalog with optional
//! external linters, and reduces the findings to per-category 0-100
//! scores in a single [`AnalysisReport`].

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod engine;
pub mod language;
pub mod models;
pub mod provider;
pub mod rules;
pub mod scoring;
pub mod tools;

pub use config::{EngineConfig, ScoreWeights};
pub use engine::{AnalysisOrchestrator, EngineError};
pub use models::{
    AnalysisCategory, AnalysisReport, FileAnalysisResult, Issue, IssueSource, Severity, SkipReason,
};
