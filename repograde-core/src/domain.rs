//! Repository snapshot model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RepogradeError;

/// Identifies a GitHub repository by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RepoId {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoId {
    /// Create a repository id from owner and name parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a repository reference: a GitHub URL, an SSH remote, or a bare
    /// `owner/name` slug.
    pub fn parse(input: &str) -> Result<Self, RepogradeError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        let slug = trimmed
            .strip_prefix("https://github.com/")
            .or_else(|| trimmed.strip_prefix("http://github.com/"))
            .or_else(|| trimmed.strip_prefix("git@github.com:"))
            .or_else(|| trimmed.strip_prefix("github.com/"))
            .unwrap_or(trimmed);
        let mut parts = slug.trim_matches('/').split('/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if owner.is_empty() || name.is_empty() {
            return Err(RepogradeError::InvalidRepo(format!(
                "expected a GitHub URL or owner/name slug, got {input:?}"
            )));
        }
        Ok(Self::new(owner, name))
    }

    /// The `owner/name` form.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Open/closed state of an issue or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// The item is open.
    Open,
    /// The item is closed or merged.
    Closed,
}

impl ItemState {
    /// Map a raw GitHub state string; anything unrecognized reads as closed.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("open") {
            Self::Open
        } else {
            Self::Closed
        }
    }

    /// Whether the item is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// A contributor sampled from the contributors endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContributorRecord {
    /// Contributor login.
    pub login: String,
    /// Contribution count attributed to this login.
    pub contributions: u64,
}

/// A commit sampled from the commit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommitRecord {
    /// Commit SHA.
    pub sha: String,
    /// Author timestamp, when the payload carried one.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A pull request sampled from the PR list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PullRequestRecord {
    /// PR number.
    pub number: u64,
    /// Open/closed state.
    pub state: ItemState,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// An issue sampled from the issue list; pull requests are filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IssueRecord {
    /// Issue number.
    pub number: u64,
    /// Open/closed state.
    pub state: ItemState,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// One fetched, read-only view of a repository at analysis time.
///
/// Every list is a bounded page sample, never full history; downstream
/// formulas normalize against sample-scale ceilings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RepoSnapshot {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Stargazer count.
    pub star_count: u64,
    /// Fork count.
    pub fork_count: u64,
    /// Repository topics, lowercased.
    pub topics: Vec<String>,
    /// Whether the repository publishes a GitHub Pages site.
    pub has_pages: bool,
    /// Decoded README contents, absent when the repository has none.
    pub readme_text: Option<String>,
    /// Bounded contributor sample.
    pub contributors: Vec<ContributorRecord>,
    /// Bounded sample of recent commits.
    pub recent_commits: Vec<CommitRecord>,
    /// Bounded pull request sample across all states.
    pub pull_requests: Vec<PullRequestRecord>,
    /// Bounded sample of open issues.
    pub issues: Vec<IssueRecord>,
}

impl RepoSnapshot {
    /// Create an empty snapshot for a repository.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            star_count: 0,
            fork_count: 0,
            topics: Vec::new(),
            has_pages: false,
            readme_text: None,
            contributors: Vec::new(),
            recent_commits: Vec::new(),
            pull_requests: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// The `owner/name` form.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
