//! HTTP handlers for the Repograde server.

use actix_web::{HttpResponse, HttpResponseBuilder, Responder, get, web};
use repograde_core::{
    AnalysisOutcome, AnalysisReport, Analyzer, FetchErrorKind, GithubConfig, GithubFetcher, RepoId,
    Result, ScoringConfig,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::openapi::ApiDoc;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Repograde</title>
    <style>
      body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; background: #10141c; color: #e6e9ef; }
      input { flex: 1; padding: 0.5rem; border: 1px solid #39404d; border-radius: 0.375rem; background: #181d27; color: inherit; }
      button { padding: 0.5rem 1rem; border: 0; border-radius: 0.375rem; background: #4662d8; color: #fff; cursor: pointer; }
      button:disabled { opacity: 0.5; }
      .row { display: flex; gap: 0.5rem; }
      .error { color: #e06c75; }
      table { border-collapse: collapse; margin-top: 1rem; }
      td, th { border: 1px solid #39404d; padding: 0.35rem 0.75rem; text-align: left; }
      pre { background: #181d27; padding: 0.75rem; border-radius: 0.375rem; overflow-x: auto; }
    </style>
  </head>
  <body>
    <h1>Repograde</h1>
    <p>Paste a GitHub repository URL or an owner/name slug to grade it.</p>
    <div class="row">
      <input id="repo" type="text" placeholder="https://github.com/owner/repo" />
      <button id="go">Analyze</button>
    </div>
    <p id="error" class="error"></p>
    <section id="out"></section>
    <script>
      const btn = document.getElementById('go');
      const input = document.getElementById('repo');
      const out = document.getElementById('out');
      const error = document.getElementById('error');

      btn.onclick = async () => {
        const repo = input.value.trim();
        error.textContent = '';
        out.innerHTML = '';
        if (!repo) { error.textContent = 'Enter a repository first.'; return; }
        btn.disabled = true;
        try {
          const resp = await fetch(`/analyze?repo=${encodeURIComponent(repo)}`);
          const data = await resp.json();
          if (data.message) throw new Error(data.message);
          out.innerHTML = `
            <table>
              <tr><th>Repository</th><td>${data.owner}/${data.repo}</td></tr>
              <tr><th>Overall</th><td>${data.overall} / 10 (${data.level})</td></tr>
              <tr><th>README</th><td>${data.scores.readme}</td></tr>
              <tr><th>Health</th><td>${data.scores.health}</td></tr>
              <tr><th>Activity</th><td>${data.scores.activity}</td></tr>
              <tr><th>Engagement</th><td>${data.scores.engagement}</td></tr>
            </table>
            <h2>Recommendations</h2>
            <ul>${data.recommendations.map(r => `<li>${r}</li>`).join('') || '<li>None.</li>'}</ul>
            <h2>Details</h2>
            <pre>${JSON.stringify(data.details, null, 2)}</pre>`;
        } catch (e) {
          error.textContent = e.message || String(e);
        } finally {
          btn.disabled = false;
        }
      };
    </script>
  </body>
</html>
"#;

/// Shared application state for handlers.
pub struct AppState {
    /// Analyzer shared by every request.
    pub analyzer: Analyzer<GithubFetcher>,
}

impl AppState {
    /// Build application state from environment variables.
    #[cfg_attr(test, allow(dead_code))]
    pub fn from_env() -> Result<Self> {
        let fetcher = GithubFetcher::new(GithubConfig::from_env())?;
        let analyzer = Analyzer::new(fetcher, ScoringConfig::default())?;
        Ok(Self { analyzer })
    }
}

/// Service liveness payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Fixed `ok` marker.
    pub status: String,
}

/// Error response payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub message: String,
}

/// Query parameters for the analyze endpoint.
#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    /// Repository reference, `owner/name` or a full GitHub URL.
    pub repo: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "HTML dashboard driving the analyze endpoint", body = String)
    ),
    tag = "system"
)]
#[get("/")]
/// Serve the browser dashboard.
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "system"
)]
#[get("/health")]
/// Report service liveness.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/analyze",
    params(
        ("repo" = Option<String>, Query, description = "Repository to grade")
    ),
    responses(
        (status = 200, description = "Analysis report", body = AnalysisReport),
        (status = 400, description = "Missing or unparseable repo parameter", body = ErrorResponse),
        (status = 404, description = "Repository not found; degraded report", body = AnalysisReport),
        (status = 401, description = "Credentials rejected; degraded report", body = AnalysisReport),
        (status = 429, description = "Rate limit exhausted; degraded report", body = AnalysisReport),
        (status = 502, description = "GitHub unreachable; degraded report", body = AnalysisReport)
    ),
    tag = "analysis"
)]
#[get("/analyze")]
/// Grade a repository and return its analysis report.
pub async fn analyze(
    state: web::Data<AppState>,
    query: web::Query<AnalyzeQuery>,
) -> impl Responder {
    let Some(raw) = query.repo.as_deref() else {
        return HttpResponse::BadRequest().json(ErrorResponse {
            message: "missing required query parameter: repo".to_string(),
        });
    };
    let repo = match RepoId::parse(raw) {
        Ok(repo) => repo,
        Err(err) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                message: err.to_string(),
            });
        }
    };

    match state.analyzer.analyze(&repo).await {
        AnalysisOutcome::Full(report) => HttpResponse::Ok().json(report),
        AnalysisOutcome::Degraded { report, reason } => {
            log::warn!("degraded report for {}: {reason}", report.slug());
            degraded_status(reason.kind).json(report)
        }
    }
}

fn degraded_status(kind: FetchErrorKind) -> HttpResponseBuilder {
    match kind {
        FetchErrorKind::NotFound => HttpResponse::NotFound(),
        FetchErrorKind::RateLimited => HttpResponse::TooManyRequests(),
        FetchErrorKind::Unauthorized => HttpResponse::Unauthorized(),
        FetchErrorKind::Network => HttpResponse::BadGateway(),
    }
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
