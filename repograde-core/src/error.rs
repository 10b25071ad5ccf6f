//! Error types for Repograde core.

use std::{error::Error, fmt};

/// Classification of a failed snapshot fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The repository does not exist or is not visible to the caller.
    NotFound,
    /// The GitHub API rate limit is exhausted.
    RateLimited,
    /// The supplied credentials were rejected.
    Unauthorized,
    /// Transport-level failure such as DNS, TLS, timeout, or a malformed payload.
    Network,
}

impl FetchErrorKind {
    /// Stable lowercase identifier for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::Network => "network",
        }
    }
}

/// Error raised by the snapshot fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    /// Failure classification.
    pub kind: FetchErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl FetchError {
    /// Create a fetch error of the given kind.
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl Error for FetchError {}

/// Error type for Repograde core operations.
#[derive(Debug)]
pub enum RepogradeError {
    /// A snapshot fetch failed.
    Fetch(FetchError),
    /// Invalid configuration detected at startup.
    Config(String),
    /// A repository reference could not be parsed.
    InvalidRepo(String),
}

impl fmt::Display for RepogradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "fetch failed: {err}"),
            Self::Config(message) => write!(f, "invalid configuration: {message}"),
            Self::InvalidRepo(message) => write!(f, "invalid repository reference: {message}"),
        }
    }
}

impl Error for RepogradeError {}

impl From<FetchError> for RepogradeError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

/// Convenience result type for Repograde core.
pub type Result<T> = std::result::Result<T, RepogradeError>;
