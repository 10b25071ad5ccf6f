#![deny(missing_docs)]
//! Repograde core library.
//!
//! This crate fetches a bounded snapshot of a GitHub repository and grades
//! it across four dimensions, producing a report with an overall score, a
//! maturity level, and improvement recommendations.

pub mod domain;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod stage;
/// Stage implementations for the scoring dimensions.
pub mod stages;
pub mod state;

pub use domain::{
    CommitRecord, ContributorRecord, IssueRecord, ItemState, PullRequestRecord, RepoId,
    RepoSnapshot,
};
pub use error::{FetchError, FetchErrorKind, RepogradeError, Result};
pub use github::{FetchResult, GithubConfig, GithubFetcher, PAGE_LIMIT, SnapshotSource};
pub use pipeline::{Analyzer, PipelinePhase};
pub use report::{
    AnalysisOutcome, AnalysisReport, CONNECTIVITY_RECOMMENDATION, ScoreBreakdown, SkillLevel,
    render_json, render_markdown,
};
pub use scoring::{Ceilings, DimensionWeights, ScoringConfig, level_for, score};
pub use stage::Stage;
pub use stages::build_stages;
pub use state::{AnalysisState, Dimension, FactMap, StageOutcome};
