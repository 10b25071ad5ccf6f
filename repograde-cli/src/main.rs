#![deny(missing_docs)]
//! Repograde command-line interface.
//!
//! Fetches a GitHub repository snapshot, grades it, and emits the report.

use clap::{Args, Parser, ValueEnum};
use repograde_core::{
    AnalysisOutcome, Analyzer, GithubConfig, GithubFetcher, RepoId, ScoringConfig, SnapshotSource,
    render_json, render_markdown,
};
use std::fmt::Write;
use std::path::PathBuf;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "repograde", version, about = "Grade a GitHub repository")]
struct Cli {
    /// Repository to grade, as `owner/name` or a full GitHub URL.
    repo: String,
    #[command(flatten)]
    github: GithubArgs,
    #[command(flatten)]
    report: OutputArgs,
    /// Fail on fetch errors instead of emitting a degraded report.
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Clone)]
struct GithubArgs {
    /// GitHub API token; unauthenticated requests are heavily rate limited.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Base URL of the GitHub REST API.
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    api_url: String,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let repo = RepoId::parse(&cli.repo)?;
    let fetcher = GithubFetcher::new(github_config(&cli.github))?;
    let analyzer = Analyzer::new(fetcher, ScoringConfig::default())?;
    let outcome = run_analysis(&analyzer, &repo, cli.strict).await?;
    emit_report(&outcome, &cli.report).await
}

#[cfg(test)]
fn main() {}

fn github_config(args: &GithubArgs) -> GithubConfig {
    let token = args
        .token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    GithubConfig {
        api_url: args.api_url.clone(),
        token,
        ..GithubConfig::default()
    }
}

async fn run_analysis<S: SnapshotSource>(
    analyzer: &Analyzer<S>,
    repo: &RepoId,
    strict: bool,
) -> CliResult<AnalysisOutcome> {
    if strict {
        let report = analyzer.analyze_strict(repo).await?;
        return Ok(AnalysisOutcome::Full(report));
    }

    let outcome = analyzer.analyze(repo).await;
    if let Some(reason) = outcome.reason() {
        eprintln!(
            "warning: grading {} from a degraded report: {reason}",
            repo.slug()
        );
    }
    Ok(outcome)
}

async fn emit_report(outcome: &AnalysisOutcome, output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_report_text(outcome),
        OutputFormat::Markdown => render_markdown(outcome),
        OutputFormat::Json => render_json(outcome.report())?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn render_report_text(outcome: &AnalysisOutcome) -> String {
    let report = outcome.report();
    let mut output = String::new();
    let _ = writeln!(output, "Repository: {}", report.slug());
    match outcome.reason() {
        Some(reason) => {
            let _ = writeln!(output, "Status: degraded ({reason})");
        }
        None => {
            let _ = writeln!(output, "Status: complete");
        }
    }
    let _ = writeln!(output, "Level: {}", report.level);
    let _ = writeln!(output, "Overall: {:.2}/10", report.overall);
    let _ = writeln!(output, "Scores:");
    let _ = writeln!(output, "- readme: {:.3}", report.scores.readme);
    let _ = writeln!(output, "- health: {:.3}", report.scores.health);
    let _ = writeln!(output, "- activity: {:.3}", report.scores.activity);
    let _ = writeln!(output, "- engagement: {:.3}", report.scores.engagement);

    if report.recommendations.is_empty() {
        let _ = writeln!(output, "Recommendations: none");
    } else {
        let _ = writeln!(output, "Recommendations:");
        for recommendation in &report.recommendations {
            let _ = writeln!(output, "- {recommendation}");
        }
    }

    if !report.details.is_empty() {
        let _ = writeln!(output, "Details:");
        for (key, value) in &report.details {
            let _ = writeln!(output, "- {key}: {value}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{
        GithubArgs, OutputArgs, OutputFormat, emit_report, github_config, render_report_text,
        run_analysis,
    };
    use repograde_core::{
        AnalysisOutcome, AnalysisReport, Analyzer, CONNECTIVITY_RECOMMENDATION, FetchError,
        FetchErrorKind, FetchResult, RepoId, RepoSnapshot, ScoreBreakdown, ScoringConfig,
        SkillLevel, SnapshotSource,
    };
    use std::collections::BTreeMap;
    use std::future::Future;
    use std::path::PathBuf;
    use std::pin::Pin;

    struct StaticSource {
        snapshot: RepoSnapshot,
    }

    impl SnapshotSource for StaticSource {
        fn fetch<'a>(
            &'a self,
            _repo: &'a RepoId,
        ) -> Pin<Box<dyn Future<Output = FetchResult<RepoSnapshot>> + Send + 'a>> {
            let snapshot = self.snapshot.clone();
            Box::pin(async move { Ok(snapshot) })
        }
    }

    struct FailingSource {
        error: FetchError,
    }

    impl SnapshotSource for FailingSource {
        fn fetch<'a>(
            &'a self,
            _repo: &'a RepoId,
        ) -> Pin<Box<dyn Future<Output = FetchResult<RepoSnapshot>> + Send + 'a>> {
            let error = self.error.clone();
            Box::pin(async move { Err(error) })
        }
    }

    fn repo() -> RepoId {
        RepoId::new("octo", "demo")
    }

    fn sample_report() -> AnalysisReport {
        let mut details = BTreeMap::new();
        details.insert("stars".to_string(), serde_json::json!(4200));
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

    static UNIQUE_COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let counter = UNIQUE_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        PathBuf::from(format!("repograde_cli_test_{nanos}_{counter}"))
    }

    #[test]
    fn github_config_maps_flags() {
        let args = GithubArgs {
            token: Some("token-123".to_string()),
            api_url: "https://ghe.example.com/api/v3".to_string(),
        };

        let config = github_config(&args);

        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.token.as_deref(), Some("token-123"));
        assert_eq!(config.user_agent, "repograde");
    }

    #[test]
    fn github_config_drops_blank_tokens() {
        let args = GithubArgs {
            token: Some("   ".to_string()),
            api_url: "https://api.github.com".to_string(),
        };

        assert_eq!(github_config(&args).token, None);
    }

    #[tokio::test]
    async fn run_analysis_returns_full_outcomes() {
        let analyzer = Analyzer::new(
            StaticSource {
                snapshot: RepoSnapshot::new("octo", "demo"),
            },
            ScoringConfig::default(),
        )
        .expect("analyzer");

        let outcome = run_analysis(&analyzer, &repo(), false)
            .await
            .expect("outcome");

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.report().slug(), "octo/demo");
    }

    #[tokio::test]
    async fn run_analysis_keeps_degraded_outcomes_without_strict() {
        let analyzer = Analyzer::new(
            FailingSource {
                error: FetchError::new(
                    FetchErrorKind::NotFound,
                    "repository octo/demo was not found",
                ),
            },
            ScoringConfig::default(),
        )
        .expect("analyzer");

        let outcome = run_analysis(&analyzer, &repo(), false)
            .await
            .expect("outcome");

        assert!(outcome.is_degraded());
        assert_eq!(
            outcome.reason().map(|reason| reason.kind),
            Some(FetchErrorKind::NotFound)
        );
    }

    #[tokio::test]
    async fn run_analysis_fails_under_strict() {
        let analyzer = Analyzer::new(
            FailingSource {
                error: FetchError::new(
                    FetchErrorKind::RateLimited,
                    "GitHub API rate limit exceeded",
                ),
            },
            ScoringConfig::default(),
        )
        .expect("analyzer");

        let error = run_analysis(&analyzer, &repo(), true)
            .await
            .expect_err("strict mode error");

        assert!(error.to_string().contains("rate_limited"));
    }

    #[tokio::test]
    async fn run_analysis_wraps_strict_success_as_full() {
        let analyzer = Analyzer::new(
            StaticSource {
                snapshot: RepoSnapshot::new("octo", "demo"),
            },
            ScoringConfig::default(),
        )
        .expect("analyzer");

        let outcome = run_analysis(&analyzer, &repo(), true)
            .await
            .expect("outcome");

        assert!(matches!(outcome, AnalysisOutcome::Full(_)));
    }

    #[test]
    fn render_report_text_covers_branches() {
        let full = AnalysisOutcome::Full(sample_report());
        let output = render_report_text(&full);

        assert!(output.contains("Repository: octo/demo"));
        assert!(output.contains("Status: complete"));
        assert!(output.contains("Level: Advanced"));
        assert!(output.contains("Overall: 7.65/10"));
        assert!(output.contains("- readme: 0.800"));
        assert!(output.contains("- engagement: 0.600"));
        assert!(output.contains("- Review and mentor on PRs."));
        assert!(output.contains("- stars: 4200"));
    }

    #[test]
    fn render_report_text_marks_degraded_runs() {
        let reason = FetchError::new(FetchErrorKind::Network, "GitHub returned status 502");
        let degraded = AnalysisOutcome::Degraded {
            report: AnalysisReport::degraded(&repo(), &reason),
            reason,
        };

        let output = render_report_text(&degraded);

        assert!(output.contains("Status: degraded (network: GitHub returned status 502)"));
        assert!(output.contains("Overall: 0.00/10"));
        assert!(output.contains("Level: Beginner"));
        assert!(output.contains(&format!("- {CONNECTIVITY_RECOMMENDATION}")));
    }

    #[test]
    fn render_report_text_labels_empty_recommendations() {
        let mut report = sample_report();
        report.recommendations.clear();
        report.details.clear();

        let output = render_report_text(&AnalysisOutcome::Full(report));

        assert!(output.contains("Recommendations: none"));
        assert!(!output.contains("Details:"));
    }

    #[tokio::test]
    async fn emit_report_supports_formats() {
        let root = std::env::temp_dir().join(unique_dir_name());
        let outcome = AnalysisOutcome::Full(sample_report());

        let markdown_path = root.join("out/report.md");
        let output = OutputArgs {
            format: OutputFormat::Markdown,
            report_output: Some(markdown_path.clone()),
        };
        emit_report(&outcome, &output).await.expect("emit markdown");
        let contents = std::fs::read_to_string(&markdown_path).expect("read markdown");
        assert!(contents.contains("# Repograde Report"));

        let json_path = root.join("out/report.json");
        let output = OutputArgs {
            format: OutputFormat::Json,
            report_output: Some(json_path.clone()),
        };
        emit_report(&outcome, &output).await.expect("emit json");
        let contents = std::fs::read_to_string(&json_path).expect("read json");
        let parsed: serde_json::Value = serde_json::from_str(&contents).expect("parse json");
        assert_eq!(parsed["owner"], "octo");
        assert_eq!(parsed["level"], "Advanced");

        let output = OutputArgs {
            format: OutputFormat::Text,
            report_output: None,
        };
        emit_report(&outcome, &output).await.expect("emit text");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }
}
