//! Graded report types and renderers.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::RepoId;
use crate::error::FetchError;
use crate::state::FactMap;

/// Recommendation attached to reports produced without repository data.
pub const CONNECTIVITY_RECOMMENDATION: &str =
    "Repository data could not be fetched; check network connectivity and GitHub credentials, then retry.";

/// Maturity level derived from the overall grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SkillLevel {
    /// Overall grade below 4.
    Beginner,
    /// Overall grade in [4, 7).
    Intermediate,
    /// Overall grade of 7 or above.
    Advanced,
}

impl SkillLevel {
    /// Stable label used in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension sub-scores, each in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreBreakdown {
    /// Documentation quality sub-score.
    pub readme: f64,
    /// Repository health sub-score.
    pub health: f64,
    /// Development activity sub-score.
    pub activity: f64,
    /// Community engagement sub-score.
    pub engagement: f64,
}

impl ScoreBreakdown {
    /// Breakdown with every sub-score at zero.
    pub fn zeroed() -> Self {
        Self {
            readme: 0.0,
            health: 0.0,
            activity: 0.0,
            engagement: 0.0,
        }
    }
}

/// Graded report for a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReport {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Per-dimension sub-scores.
    pub scores: ScoreBreakdown,
    /// Weighted overall grade in [0, 10].
    pub overall: f64,
    /// Maturity level derived from the overall grade.
    pub level: SkillLevel,
    /// Actionable improvement suggestions.
    pub recommendations: Vec<String>,
    /// Supporting facts recorded by the scoring stages.
    pub details: FactMap,
}

impl AnalysisReport {
    /// Create a placeholder report for a repository whose data could not be
    /// fetched. Scores are zero and the only recommendation points at the
    /// connection, not the repository.
    pub fn degraded(repo: &RepoId, reason: &FetchError) -> Self {
        let mut details = FactMap::new();
        details.insert("fetch_error".to_string(), Value::String(reason.to_string()));
        Self {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            scores: ScoreBreakdown::zeroed(),
            overall: 0.0,
            level: SkillLevel::Beginner,
            recommendations: vec![CONNECTIVITY_RECOMMENDATION.to_string()],
            details,
        }
    }

    /// `owner/name` form of the graded repository.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Result of a full analysis run.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// Every fetch succeeded and the report reflects live data.
    Full(AnalysisReport),
    /// The fetch failed; the report is a zeroed placeholder.
    Degraded {
        /// Placeholder report produced by [`AnalysisReport::degraded`].
        report: AnalysisReport,
        /// Error that prevented the fetch.
        reason: FetchError,
    },
}

impl AnalysisOutcome {
    /// The report carried by either variant.
    pub fn report(&self) -> &AnalysisReport {
        match self {
            Self::Full(report) => report,
            Self::Degraded { report, .. } => report,
        }
    }

    /// Whether the fetch failed and the report is a placeholder.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The fetch error behind a degraded outcome.
    pub fn reason(&self) -> Option<&FetchError> {
        match self {
            Self::Full(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// Render an analysis outcome as Markdown.
pub fn render_markdown(outcome: &AnalysisOutcome) -> String {
    let report = outcome.report();
    let mut output = String::new();
    let _ = writeln!(output, "# Repograde Report\n");
    let _ = writeln!(output, "## {}\n", report.slug());
    match outcome.reason() {
        Some(reason) => {
            let _ = writeln!(output, "- Status: degraded ({reason})");
        }
        None => {
            let _ = writeln!(output, "- Status: complete");
        }
    }
    let _ = writeln!(output, "- Level: {}", report.level);
    let _ = writeln!(output, "- Overall: {:.2}/10\n", report.overall);
    append_scores(&mut output, &report.scores);
    append_list(
        &mut output,
        "Recommendations",
        &report.recommendations,
        "No recommendations.",
    );
    append_details(&mut output, &report.details);
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn append_scores(output: &mut String, scores: &ScoreBreakdown) {
    let _ = writeln!(output, "### Scores");
    let _ = writeln!(output, "- readme: {:.3}", scores.readme);
    let _ = writeln!(output, "- health: {:.3}", scores.health);
    let _ = writeln!(output, "- activity: {:.3}", scores.activity);
    let _ = writeln!(output, "- engagement: {:.3}", scores.engagement);
    let _ = writeln!(output);
}

fn append_details(output: &mut String, details: &FactMap) {
    if details.is_empty() {
        let _ = writeln!(output, "### Details\nNo details recorded.\n");
        return;
    }
    let _ = writeln!(output, "### Details");
    for (key, value) in details {
        let _ = writeln!(output, "- {key}: {value}");
    }
    let _ = writeln!(output);
}

fn append_list(output: &mut String, title: &str, items: &[String], empty_message: &str) {
    if items.is_empty() {
        let _ = writeln!(output, "### {title}\n{empty_message}\n");
        return;
    }
    let _ = writeln!(output, "### {title}");
    for item in items {
        let _ = writeln!(output, "- {item}");
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use serde_json::json;

    fn sample_report() -> AnalysisReport {
        let mut details = FactMap::new();
        details.insert("stars".to_string(), json!(6000));
        details.insert("readme_present".to_string(), json!(true));
        AnalysisReport {
            owner: "octo".to_string(),
            repo: "demo".to_string(),
            scores: ScoreBreakdown {
                readme: 0.8,
                health: 0.75,
                activity: 0.9,
                engagement: 0.6,
            },
            overall: 7.65,
            level: SkillLevel::Advanced,
            recommendations: vec!["Review and mentor on PRs.".to_string()],
            details,
        }
    }

    #[test]
    fn degraded_report_carries_connectivity_advice() {
        let repo = RepoId::new("octo", "demo");
        let reason = FetchError::new(FetchErrorKind::Network, "connection refused");
        let report = AnalysisReport::degraded(&repo, &reason);

        assert_eq!(report.scores, ScoreBreakdown::zeroed());
        assert_eq!(report.overall, 0.0);
        assert_eq!(report.level, SkillLevel::Beginner);
        assert_eq!(report.recommendations, vec![CONNECTIVITY_RECOMMENDATION]);
        let detail = report.details.get("fetch_error").expect("fetch_error");
        assert_eq!(detail, &json!("network: connection refused"));
    }

    #[test]
    fn renders_full_markdown() {
        let outcome = AnalysisOutcome::Full(sample_report());
        let output = render_markdown(&outcome);
        assert!(output.contains("# Repograde Report"));
        assert!(output.contains("## octo/demo"));
        assert!(output.contains("- Status: complete"));
        assert!(output.contains("- Level: Advanced"));
        assert!(output.contains("- Overall: 7.65/10"));
        assert!(output.contains("- readme: 0.800"));
        assert!(output.contains("Review and mentor on PRs."));
        assert!(output.contains("- stars: 6000"));
    }

    #[test]
    fn renders_degraded_markdown() {
        let repo = RepoId::new("octo", "demo");
        let reason = FetchError::new(FetchErrorKind::RateLimited, "api rate limit exceeded");
        let outcome = AnalysisOutcome::Degraded {
            report: AnalysisReport::degraded(&repo, &reason),
            reason,
        };
        let output = render_markdown(&outcome);
        assert!(output.contains("- Status: degraded (rate_limited: api rate limit exceeded)"));
        assert!(output.contains(CONNECTIVITY_RECOMMENDATION));
    }

    #[test]
    fn renders_json_wire_shape() {
        let json = render_json(&sample_report()).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["owner"], "octo");
        assert_eq!(parsed["repo"], "demo");
        assert_eq!(parsed["scores"]["readme"], 0.8);
        assert_eq!(parsed["scores"]["engagement"], 0.6);
        assert_eq!(parsed["overall"], 7.65);
        assert_eq!(parsed["level"], "Advanced");
        assert!(parsed["recommendations"].is_array());
        assert_eq!(parsed["details"]["readme_present"], true);
    }

    #[test]
    fn skill_level_labels_are_stable() {
        assert_eq!(SkillLevel::Beginner.as_str(), "Beginner");
        assert_eq!(SkillLevel::Intermediate.as_str(), "Intermediate");
        assert_eq!(SkillLevel::Advanced.as_str(), "Advanced");
        assert_eq!(SkillLevel::Advanced.to_string(), "Advanced");
    }
}
