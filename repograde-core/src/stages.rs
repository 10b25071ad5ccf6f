//! Stage implementations for the four scoring dimensions.

use chrono::Duration;
use serde_json::json;

use crate::scoring::ScoringConfig;
use crate::stage::Stage;
use crate::state::{AnalysisState, Dimension, FactMap, StageOutcome};

// Documentation: five equally weighted criteria.
const SECTION_WEIGHT: f64 = 0.2;
const INSTALL_KEYWORDS: [&str; 2] = ["install", "getting started"];
const LICENSE_KEYWORDS: [&str; 2] = ["license", "mit"];
const CONTRIBUTING_KEYWORDS: [&str; 2] = ["contributing", "contribution"];

// Health components.
const STARS_WEIGHT: f64 = 0.35;
const FORKS_WEIGHT: f64 = 0.20;
const CONTRIBUTORS_WEIGHT: f64 = 0.25;
const CI_WEIGHT: f64 = 0.20;
const CI_TOPICS: [&str; 3] = ["ci", "github-actions", "tests"];

// Activity components.
const COMMITS_WEIGHT: f64 = 0.6;
const PULLS_WEIGHT: f64 = 0.4;

// Engagement components.
const OPEN_ISSUES_WEIGHT: f64 = 0.5;
const OPEN_PULLS_WEIGHT: f64 = 0.5;

/// Assemble the scoring stages in pipeline order.
pub fn build_stages(config: &ScoringConfig) -> Vec<Box<dyn Stage + Send + Sync>> {
    vec![
        Box::new(DocumentationStage {
            length_threshold: config.readme_length_threshold,
        }),
        Box::new(HealthStage {
            star_ceiling: config.ceilings.stars,
            fork_ceiling: config.ceilings.forks,
            contributor_ceiling: config.ceilings.contributors,
        }),
        Box::new(ActivityStage {
            window_days: config.activity_window_days,
            commit_ceiling: config.ceilings.commits,
            pull_ceiling: config.ceilings.pull_requests,
        }),
        Box::new(EngagementStage {
            issue_ceiling: config.ceilings.open_issues,
            pull_ceiling: config.ceilings.open_pulls,
        }),
    ]
}

/// Scores README quality: presence, substance, and the install, license
/// and contributing sections, each worth one fifth.
struct DocumentationStage {
    length_threshold: usize,
}

impl Stage for DocumentationStage {
    fn dimension(&self) -> Dimension {
        Dimension::Documentation
    }

    fn evaluate(&self, state: &AnalysisState) -> StageOutcome {
        let mut facts = FactMap::new();
        let readme = state.snapshot().readme_text.as_deref().unwrap_or_default();
        // An empty README is indistinguishable from a missing one.
        if readme.is_empty() {
            facts.insert("readme_present".to_string(), json!(false));
            facts.insert("readme_length".to_string(), json!(0));
            facts.insert("has_install_section".to_string(), json!(false));
            facts.insert("has_license_section".to_string(), json!(false));
            facts.insert("has_contributing_section".to_string(), json!(false));
            return StageOutcome::new(0.0, facts);
        }

        let length = readme.chars().count();
        let normalized = readme.to_lowercase();
        let has_install = contains_any(&normalized, &INSTALL_KEYWORDS);
        let has_license = contains_any(&normalized, &LICENSE_KEYWORDS);
        let has_contributing = contains_any(&normalized, &CONTRIBUTING_KEYWORDS);

        let mut score = SECTION_WEIGHT;
        if length > self.length_threshold {
            score += SECTION_WEIGHT;
        }
        for detected in [has_install, has_license, has_contributing] {
            if detected {
                score += SECTION_WEIGHT;
            }
        }

        facts.insert("readme_present".to_string(), json!(true));
        facts.insert("readme_length".to_string(), json!(length));
        facts.insert("has_install_section".to_string(), json!(has_install));
        facts.insert("has_license_section".to_string(), json!(has_license));
        facts.insert("has_contributing_section".to_string(), json!(has_contributing));
        StageOutcome::new(score.min(1.0), facts)
    }
}

/// Scores popularity and maintenance signals: stars, forks, contributor
/// count, and a CI topic bonus.
struct HealthStage {
    star_ceiling: f64,
    fork_ceiling: f64,
    contributor_ceiling: f64,
}

impl Stage for HealthStage {
    fn dimension(&self) -> Dimension {
        Dimension::Health
    }

    fn evaluate(&self, state: &AnalysisState) -> StageOutcome {
        let snapshot = state.snapshot();
        // A published Pages site implies a deploy pipeline even when the
        // topics never mention CI.
        let ci_detected = snapshot.has_pages
            || snapshot
                .topics
                .iter()
                .any(|topic| CI_TOPICS.iter().any(|ci| topic.eq_ignore_ascii_case(ci)));

        let score = STARS_WEIGHT * ratio(snapshot.star_count as f64, self.star_ceiling)
            + FORKS_WEIGHT * ratio(snapshot.fork_count as f64, self.fork_ceiling)
            + CONTRIBUTORS_WEIGHT
                * ratio(snapshot.contributors.len() as f64, self.contributor_ceiling)
            + if ci_detected { CI_WEIGHT } else { 0.0 };

        let mut facts = FactMap::new();
        facts.insert("stars".to_string(), json!(snapshot.star_count));
        facts.insert("forks".to_string(), json!(snapshot.fork_count));
        facts.insert("contributors".to_string(), json!(snapshot.contributors.len()));
        facts.insert("ci_detected".to_string(), json!(ci_detected));
        StageOutcome::new(score.min(1.0), facts)
    }
}

/// Scores development cadence from commits inside the recency window and
/// the size of the pull-request sample.
struct ActivityStage {
    window_days: i64,
    commit_ceiling: f64,
    pull_ceiling: f64,
}

impl Stage for ActivityStage {
    fn dimension(&self) -> Dimension {
        Dimension::Activity
    }

    fn evaluate(&self, state: &AnalysisState) -> StageOutcome {
        let snapshot = state.snapshot();
        let cutoff = state.analyzed_at() - Duration::days(self.window_days);
        let commits_sampled = snapshot.recent_commits.len();
        let commits_recent = snapshot
            .recent_commits
            .iter()
            .filter(|commit| commit.timestamp.is_some_and(|at| at >= cutoff))
            .count();
        let sampled_pulls = snapshot.pull_requests.len();

        let score = COMMITS_WEIGHT * ratio(commits_recent as f64, self.commit_ceiling)
            + PULLS_WEIGHT * ratio(sampled_pulls as f64, self.pull_ceiling);

        let mut facts = FactMap::new();
        facts.insert("commits_sampled".to_string(), json!(commits_sampled));
        facts.insert("commits_recent".to_string(), json!(commits_recent));
        facts.insert("prs_sampled".to_string(), json!(sampled_pulls));
        StageOutcome::new(score.min(1.0), facts)
    }
}

/// Scores community engagement from open issues and open pull requests.
struct EngagementStage {
    issue_ceiling: f64,
    pull_ceiling: f64,
}

impl Stage for EngagementStage {
    fn dimension(&self) -> Dimension {
        Dimension::Engagement
    }

    fn evaluate(&self, state: &AnalysisState) -> StageOutcome {
        let snapshot = state.snapshot();
        let open_issues = snapshot
            .issues
            .iter()
            .filter(|issue| issue.state.is_open())
            .count();
        let open_pulls = snapshot
            .pull_requests
            .iter()
            .filter(|pull| pull.state.is_open())
            .count();

        let score = OPEN_ISSUES_WEIGHT * ratio(open_issues as f64, self.issue_ceiling)
            + OPEN_PULLS_WEIGHT * ratio(open_pulls as f64, self.pull_ceiling);

        let mut facts = FactMap::new();
        facts.insert("open_issues".to_string(), json!(open_issues));
        facts.insert("open_prs".to_string(), json!(open_pulls));
        StageOutcome::new(score.min(1.0), facts)
    }
}

fn ratio(count: f64, ceiling: f64) -> f64 {
    (count / ceiling).min(1.0)
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CommitRecord, ContributorRecord, IssueRecord, ItemState, PullRequestRecord, RepoSnapshot,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn analyzed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn state_for(snapshot: RepoSnapshot) -> AnalysisState {
        AnalysisState::new(snapshot, analyzed_at())
    }

    fn stages() -> Vec<Box<dyn Stage + Send + Sync>> {
        build_stages(&ScoringConfig::default())
    }

    fn stage_for(dimension: Dimension) -> Box<dyn Stage + Send + Sync> {
        stages()
            .into_iter()
            .find(|stage| stage.dimension() == dimension)
            .expect("stage")
    }

    fn commit(days_ago: i64) -> CommitRecord {
        CommitRecord {
            sha: format!("sha-{days_ago}"),
            timestamp: Some(analyzed_at() - Duration::days(days_ago)),
        }
    }

    fn pull(number: u64, state: ItemState) -> PullRequestRecord {
        PullRequestRecord {
            number,
            state,
            created_at: Some(analyzed_at()),
            updated_at: None,
        }
    }

    fn issue(number: u64, state: ItemState) -> IssueRecord {
        IssueRecord {
            number,
            state,
            created_at: Some(analyzed_at()),
        }
    }

    #[test]
    fn build_order_matches_dimension_order() {
        let order: Vec<Dimension> = stages().iter().map(|stage| stage.dimension()).collect();
        assert_eq!(order, Dimension::ALL.to_vec());
    }

    #[test]
    fn missing_readme_scores_zero() {
        let stage = stage_for(Dimension::Documentation);
        let outcome = stage.evaluate(&state_for(RepoSnapshot::new("octo", "demo")));

        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.facts.get("readme_present"), Some(&json!(false)));
        assert_eq!(outcome.facts.get("readme_length"), Some(&json!(0)));
        assert_eq!(outcome.facts.get("has_install_section"), Some(&json!(false)));
        assert_eq!(outcome.facts.get("has_license_section"), Some(&json!(false)));
        assert_eq!(
            outcome.facts.get("has_contributing_section"),
            Some(&json!(false))
        );
    }

    #[test]
    fn empty_readme_counts_as_missing() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.readme_text = Some(String::new());
        let outcome = stage_for(Dimension::Documentation).evaluate(&state_for(snapshot));

        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.facts.get("readme_present"), Some(&json!(false)));
    }

    #[test]
    fn short_readme_scores_presence_only() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.readme_text = Some("a tiny project".to_string());
        let outcome = stage_for(Dimension::Documentation).evaluate(&state_for(snapshot));

        assert!((outcome.score - SECTION_WEIGHT).abs() < 1e-9);
        assert_eq!(outcome.facts.get("readme_present"), Some(&json!(true)));
        assert_eq!(outcome.facts.get("readme_length"), Some(&json!(14)));
    }

    #[test]
    fn complete_readme_saturates() {
        let mut body = String::from("# Demo\n\n## INSTALL\n\n## LICENSE (MIT)\n\n## CONTRIBUTING\n\n");
        body.push_str(&"All the usage documentation you could want. ".repeat(12));
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.readme_text = Some(body);
        let outcome = stage_for(Dimension::Documentation).evaluate(&state_for(snapshot));

        assert!((outcome.score - 1.0).abs() < 1e-9);
        assert_eq!(outcome.facts.get("has_install_section"), Some(&json!(true)));
        assert_eq!(outcome.facts.get("has_license_section"), Some(&json!(true)));
        assert_eq!(
            outcome.facts.get("has_contributing_section"),
            Some(&json!(true))
        );
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.readme_text = Some("## GETTING STARTED".to_string());
        let outcome = stage_for(Dimension::Documentation).evaluate(&state_for(snapshot));

        // Presence plus the install-section group.
        assert!((outcome.score - 2.0 * SECTION_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn health_saturates_at_the_ceilings() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.star_count = 5000;
        snapshot.fork_count = 1000;
        snapshot.contributors = (0..50)
            .map(|index| ContributorRecord {
                login: format!("user-{index}"),
                contributions: 1,
            })
            .collect();
        snapshot.topics = vec!["CI".to_string()];
        let outcome = stage_for(Dimension::Health).evaluate(&state_for(snapshot));

        assert!((outcome.score - 1.0).abs() < 1e-9);
        assert_eq!(outcome.facts.get("ci_detected"), Some(&json!(true)));
        assert_eq!(outcome.facts.get("stars"), Some(&json!(5000)));
    }

    #[test]
    fn health_of_empty_snapshot_is_zero() {
        let outcome = stage_for(Dimension::Health).evaluate(&state_for(RepoSnapshot::new(
            "octo", "demo",
        )));

        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.facts.get("ci_detected"), Some(&json!(false)));
    }

    #[test]
    fn ci_topic_alone_earns_the_bonus() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.topics = vec!["rust".to_string(), "github-actions".to_string()];
        let outcome = stage_for(Dimension::Health).evaluate(&state_for(snapshot));

        assert_eq!(outcome.score, CI_WEIGHT);
    }

    #[test]
    fn pages_site_counts_as_ci_without_topics() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.has_pages = true;
        let outcome = stage_for(Dimension::Health).evaluate(&state_for(snapshot));

        assert_eq!(outcome.score, CI_WEIGHT);
        assert_eq!(outcome.facts.get("ci_detected"), Some(&json!(true)));
    }

    #[test]
    fn contributor_count_scales_linearly() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.contributors = (0..25)
            .map(|index| ContributorRecord {
                login: format!("user-{index}"),
                contributions: 1,
            })
            .collect();
        let outcome = stage_for(Dimension::Health).evaluate(&state_for(snapshot));

        assert_eq!(outcome.score, CONTRIBUTORS_WEIGHT * 0.5);
    }

    #[test]
    fn activity_counts_commits_inside_the_window() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.recent_commits = (0..25).map(|_| commit(10)).collect();
        snapshot.recent_commits.push(commit(120));
        snapshot.pull_requests = (0..50).map(|n| pull(n, ItemState::Closed)).collect();
        let outcome = stage_for(Dimension::Activity).evaluate(&state_for(snapshot));

        assert!((outcome.score - 0.35).abs() < 1e-9);
        assert_eq!(outcome.facts.get("commits_sampled"), Some(&json!(26)));
        assert_eq!(outcome.facts.get("commits_recent"), Some(&json!(25)));
        assert_eq!(outcome.facts.get("prs_sampled"), Some(&json!(50)));
    }

    #[test]
    fn activity_skips_commits_without_timestamps() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.recent_commits = vec![CommitRecord {
            sha: "deadbeef".to_string(),
            timestamp: None,
        }];
        let outcome = stage_for(Dimension::Activity).evaluate(&state_for(snapshot));

        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.facts.get("commits_sampled"), Some(&json!(1)));
        assert_eq!(outcome.facts.get("commits_recent"), Some(&json!(0)));
    }

    #[test]
    fn engagement_counts_open_items_only() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.issues = vec![
            issue(1, ItemState::Open),
            issue(2, ItemState::Open),
            issue(3, ItemState::Closed),
        ];
        snapshot.pull_requests = vec![pull(4, ItemState::Open), pull(5, ItemState::Closed)];
        let outcome = stage_for(Dimension::Engagement).evaluate(&state_for(snapshot));

        assert!((outcome.score - 0.015).abs() < 1e-9);
        assert_eq!(outcome.facts.get("open_issues"), Some(&json!(2)));
        assert_eq!(outcome.facts.get("open_prs"), Some(&json!(1)));
    }

    #[test]
    fn engagement_saturates_at_the_ceilings() {
        let mut snapshot = RepoSnapshot::new("octo", "demo");
        snapshot.issues = (0..100).map(|n| issue(n, ItemState::Open)).collect();
        snapshot.pull_requests = (0..100).map(|n| pull(n, ItemState::Open)).collect();
        let outcome = stage_for(Dimension::Engagement).evaluate(&state_for(snapshot));

        assert_eq!(outcome.score, 1.0);
    }
}
