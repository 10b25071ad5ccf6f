//! Composite scoring configuration and report assembly.

use crate::error::{RepogradeError, Result};
use crate::report::{AnalysisReport, ScoreBreakdown, SkillLevel};
use crate::state::{AnalysisState, Dimension, FactMap};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

const DOCUMENTATION_THRESHOLD: f64 = 0.5;
const HEALTH_THRESHOLD: f64 = 0.4;
const ACTIVITY_THRESHOLD: f64 = 0.4;
const ENGAGEMENT_THRESHOLD: f64 = 0.3;

const DOCUMENTATION_ADVICE: &str = "Add a README with installation and usage instructions.";
const HEALTH_ADVICE: &str = "Add CI and encourage contributions to improve repository health.";
const ACTIVITY_ADVICE: &str = "Increase commit cadence or merge pull requests more regularly.";
const ENGAGEMENT_ADVICE: &str = "Encourage issue reports and pull requests from users.";

const ADVANCED_ADVICE: [&str; 3] = [
    "Propose architectural improvements or refactors.",
    "Review and mentor on PRs.",
    "Optimize CI/CD, performance, or reliability.",
];

/// Weights applied to the four sub-scores when computing the overall grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionWeights {
    /// Weight of the documentation sub-score.
    pub documentation: f64,
    /// Weight of the health sub-score.
    pub health: f64,
    /// Weight of the activity sub-score.
    pub activity: f64,
    /// Weight of the engagement sub-score.
    pub engagement: f64,
}

impl DimensionWeights {
    fn sum(&self) -> f64 {
        self.documentation + self.health + self.activity + self.engagement
    }
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            documentation: 0.15,
            health: 0.30,
            activity: 0.30,
            engagement: 0.25,
        }
    }
}

/// Saturation ceilings for raw counts. A count at or above its ceiling
/// contributes a full 1.0 to its component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ceilings {
    /// Star count that saturates the star component.
    pub stars: f64,
    /// Fork count that saturates the fork component.
    pub forks: f64,
    /// Contributor count that saturates the contributor component.
    pub contributors: f64,
    /// Recent-commit count that saturates the commit component.
    pub commits: f64,
    /// Sampled pull-request count that saturates the PR component.
    pub pull_requests: f64,
    /// Open-issue count that saturates the issue component.
    pub open_issues: f64,
    /// Open-PR count that saturates the open-PR component.
    pub open_pulls: f64,
}

impl Default for Ceilings {
    fn default() -> Self {
        Self {
            stars: 5000.0,
            forks: 1000.0,
            contributors: 50.0,
            commits: 100.0,
            pull_requests: 100.0,
            open_issues: 100.0,
            open_pulls: 100.0,
        }
    }
}

/// Tunable scoring parameters.
///
/// The defaults match the stock grading rules; validation catches
/// configurations that would produce out-of-range grades.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Dimension weights for the overall grade; must sum to 1.
    pub weights: DimensionWeights,
    /// Saturation ceilings for raw counts; must be positive.
    pub ceilings: Ceilings,
    /// Recency window, in days, for counting a commit as recent.
    pub activity_window_days: i64,
    /// Character count beyond which a README counts as substantial.
    pub readme_length_threshold: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: DimensionWeights::default(),
            ceilings: Ceilings::default(),
            activity_window_days: 90,
            readme_length_threshold: 400,
        }
    }
}

impl ScoringConfig {
    /// Check the configuration invariants: weights summing to 1 within
    /// tolerance, positive ceilings, and a window of at least one day.
    pub fn validate(&self) -> Result<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RepogradeError::Config(format!(
                "dimension weights must sum to 1.0, got {sum}"
            )));
        }
        let ceilings = [
            ("stars", self.ceilings.stars),
            ("forks", self.ceilings.forks),
            ("contributors", self.ceilings.contributors),
            ("commits", self.ceilings.commits),
            ("pull_requests", self.ceilings.pull_requests),
            ("open_issues", self.ceilings.open_issues),
            ("open_pulls", self.ceilings.open_pulls),
        ];
        for (name, value) in ceilings {
            if value <= 0.0 {
                return Err(RepogradeError::Config(format!(
                    "{name} ceiling must be positive, got {value}"
                )));
            }
        }
        if self.activity_window_days <= 0 {
            return Err(RepogradeError::Config(format!(
                "activity window must cover at least one day, got {}",
                self.activity_window_days
            )));
        }
        Ok(())
    }
}

/// Map an overall grade to its level. Boundary values land in the higher
/// band: 4.0 is `Intermediate`, 7.0 is `Advanced`.
pub fn level_for(overall: f64) -> SkillLevel {
    if overall < 4.0 {
        SkillLevel::Beginner
    } else if overall < 7.0 {
        SkillLevel::Intermediate
    } else {
        SkillLevel::Advanced
    }
}

/// Fold the recorded stage outcomes into a final report.
///
/// Dimensions without a recorded outcome read as zero, so a partially
/// populated state still yields a structurally complete report. Sub-scores
/// are rounded to three decimals, the overall grade to two.
pub fn score(state: &AnalysisState, config: &ScoringConfig) -> AnalysisReport {
    let scores = ScoreBreakdown {
        readme: sub_score(state, Dimension::Documentation),
        health: sub_score(state, Dimension::Health),
        activity: sub_score(state, Dimension::Activity),
        engagement: sub_score(state, Dimension::Engagement),
    };

    let weights = &config.weights;
    let weighted = weights.documentation * scores.readme
        + weights.health * scores.health
        + weights.activity * scores.activity
        + weights.engagement * scores.engagement;
    let overall = round2((10.0 * weighted).clamp(0.0, 10.0));
    let level = level_for(overall);
    let recommendations = recommendations_for(&scores, level);

    let mut details = FactMap::new();
    for dimension in Dimension::ALL {
        if let Some(facts) = state.facts(dimension) {
            details.extend(facts.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
    }

    AnalysisReport {
        owner: state.snapshot().owner.clone(),
        repo: state.snapshot().name.clone(),
        scores,
        overall,
        level,
        recommendations,
        details,
    }
}

fn sub_score(state: &AnalysisState, dimension: Dimension) -> f64 {
    round3(state.score(dimension).unwrap_or(0.0).clamp(0.0, 1.0))
}

fn recommendations_for(scores: &ScoreBreakdown, level: SkillLevel) -> Vec<String> {
    let mut recommendations = Vec::new();
    if scores.readme < DOCUMENTATION_THRESHOLD {
        recommendations.push(DOCUMENTATION_ADVICE.to_string());
    }
    if scores.health < HEALTH_THRESHOLD {
        recommendations.push(HEALTH_ADVICE.to_string());
    }
    if scores.activity < ACTIVITY_THRESHOLD {
        recommendations.push(ACTIVITY_ADVICE.to_string());
    }
    if scores.engagement < ENGAGEMENT_THRESHOLD {
        recommendations.push(ENGAGEMENT_ADVICE.to_string());
    }
    if level == SkillLevel::Advanced {
        recommendations.extend(ADVANCED_ADVICE.iter().map(|advice| advice.to_string()));
    }
    recommendations
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
