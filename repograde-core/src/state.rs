//! Pipeline state accumulator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::RepoSnapshot;

/// Analysis dimension scored by one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dimension {
    /// README and documentation quality.
    Documentation,
    /// Popularity and maintenance signals.
    Health,
    /// Commit and pull-request cadence.
    Activity,
    /// Community engagement through open items.
    Engagement,
}

impl Dimension {
    /// All dimensions in pipeline order.
    pub const ALL: [Dimension; 4] = [
        Self::Documentation,
        Self::Health,
        Self::Activity,
        Self::Engagement,
    ];

    /// Stable lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documentation => "documentation",
            Self::Health => "health",
            Self::Activity => "activity",
            Self::Engagement => "engagement",
        }
    }
}

/// Facts recorded by a stage and surfaced in the final report.
pub type FactMap = BTreeMap<String, Value>;

/// Result of one scoring stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    /// Normalized sub-score in [0, 1].
    pub score: f64,
    /// Supporting facts for the scored dimension.
    pub facts: FactMap,
}

impl StageOutcome {
    /// Create an outcome from a score and its facts.
    pub fn new(score: f64, facts: FactMap) -> Self {
        Self { score, facts }
    }
}

/// Accumulator threaded through the scoring pipeline.
///
/// Built once per invocation from a snapshot and an injected timestamp,
/// discarded after the report is produced. Stages read; only the
/// orchestrator writes, one dimension each.
#[derive(Debug, Clone)]
pub struct AnalysisState {
    snapshot: RepoSnapshot,
    analyzed_at: DateTime<Utc>,
    outcomes: BTreeMap<Dimension, StageOutcome>,
}

impl AnalysisState {
    /// Create a fresh state over a snapshot.
    ///
    /// `analyzed_at` is the reference point for recency windows; stages
    /// never read the system clock themselves.
    pub fn new(snapshot: RepoSnapshot, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            analyzed_at,
            outcomes: BTreeMap::new(),
        }
    }

    /// The fetched snapshot.
    pub fn snapshot(&self) -> &RepoSnapshot {
        &self.snapshot
    }

    /// Reference timestamp for recency windows.
    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    /// Record a stage outcome. The first write for a dimension wins; later
    /// writes are ignored.
    pub fn record(&mut self, dimension: Dimension, outcome: StageOutcome) {
        self.outcomes.entry(dimension).or_insert(outcome);
    }

    /// Sub-score recorded for a dimension, if any.
    pub fn score(&self, dimension: Dimension) -> Option<f64> {
        self.outcomes.get(&dimension).map(|outcome| outcome.score)
    }

    /// Facts recorded for a dimension, if any.
    pub fn facts(&self, dimension: Dimension) -> Option<&FactMap> {
        self.outcomes.get(&dimension).map(|outcome| &outcome.facts)
    }

    /// All recorded outcomes, keyed in dimension order.
    pub fn outcomes(&self) -> &BTreeMap<Dimension, StageOutcome> {
        &self.outcomes
    }
}
