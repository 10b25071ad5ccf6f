//! Analysis orchestration: fetch, staged scoring, report assembly.

use chrono::{DateTime, Utc};

use crate::domain::{RepoId, RepoSnapshot};
use crate::error::{FetchError, Result};
use crate::github::SnapshotSource;
use crate::report::{AnalysisOutcome, AnalysisReport};
use crate::scoring::{self, ScoringConfig};
use crate::stage::Stage;
use crate::stages::build_stages;
use crate::state::{AnalysisState, Dimension};

/// Phases of one analysis run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Run accepted, nothing started.
    Init,
    /// Snapshot fetch in flight.
    Fetching,
    /// Documentation stage.
    Documentation,
    /// Health stage.
    Health,
    /// Activity stage.
    Activity,
    /// Engagement stage.
    Engagement,
    /// Composite scoring.
    Scoring,
    /// Report produced.
    Done,
    /// Fetch failed; a degraded report was produced instead.
    Failed,
}

impl PipelinePhase {
    /// The phase that follows this one on the success path. Terminal
    /// phases return themselves.
    pub fn next(self) -> Self {
        match self {
            Self::Init => Self::Fetching,
            Self::Fetching => Self::Documentation,
            Self::Documentation => Self::Health,
            Self::Health => Self::Activity,
            Self::Activity => Self::Engagement,
            Self::Engagement => Self::Scoring,
            Self::Scoring => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    /// Whether this phase may transition to [`PipelinePhase::Failed`].
    /// Only the fetch can fail; stages and scoring are total.
    pub fn can_fail(self) -> bool {
        self == Self::Fetching
    }

    /// The scoring dimension evaluated in this phase, if any.
    pub fn dimension(self) -> Option<Dimension> {
        match self {
            Self::Documentation => Some(Dimension::Documentation),
            Self::Health => Some(Dimension::Health),
            Self::Activity => Some(Dimension::Activity),
            Self::Engagement => Some(Dimension::Engagement),
            _ => None,
        }
    }
}

/// Orchestrates the fetch, the scoring stages, and report assembly.
pub struct Analyzer<S: SnapshotSource> {
    source: S,
    stages: Vec<Box<dyn Stage + Send + Sync>>,
    config: ScoringConfig,
}

impl<S: SnapshotSource> Analyzer<S> {
    /// Create an analyzer over a snapshot source, validating the scoring
    /// configuration before any request runs.
    pub fn new(source: S, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        let stages = build_stages(&config);
        Ok(Self {
            source,
            stages,
            config,
        })
    }

    /// Analyze a repository, degrading to a placeholder report when the
    /// fetch fails.
    pub async fn analyze(&self, repo: &RepoId) -> AnalysisOutcome {
        match self.source.fetch(repo).await {
            Ok(snapshot) => AnalysisOutcome::Full(self.run_stages(snapshot, Utc::now())),
            Err(reason) => AnalysisOutcome::Degraded {
                report: AnalysisReport::degraded(repo, &reason),
                reason,
            },
        }
    }

    /// Analyze a repository, propagating the fetch error instead of
    /// degrading.
    pub async fn analyze_strict(
        &self,
        repo: &RepoId,
    ) -> std::result::Result<AnalysisReport, FetchError> {
        let snapshot = self.source.fetch(repo).await?;
        Ok(self.run_stages(snapshot, Utc::now()))
    }

    /// Run the scoring stages over an already fetched snapshot.
    ///
    /// The clock is injected: identical snapshots and timestamps produce
    /// identical reports. The phase machine supplies the stage order.
    pub fn run_stages(&self, snapshot: RepoSnapshot, analyzed_at: DateTime<Utc>) -> AnalysisReport {
        let mut state = AnalysisState::new(snapshot, analyzed_at);
        let mut phase = PipelinePhase::Fetching.next();
        while let Some(dimension) = phase.dimension() {
            if let Some(stage) = self
                .stages
                .iter()
                .find(|stage| stage.dimension() == dimension)
            {
                let outcome = stage.evaluate(&state);
                state.record(dimension, outcome);
            }
            phase = phase.next();
        }
        scoring::score(&state, &self.config)
    }
}
