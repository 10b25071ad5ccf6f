//! OpenAPI specification for the Repograde server.

use utoipa::OpenApi;

use repograde_core::{AnalysisReport, ScoreBreakdown, SkillLevel};

use crate::routes::{ErrorResponse, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::index,
        crate::routes::health,
        crate::routes::analyze,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            AnalysisReport,
            ScoreBreakdown,
            SkillLevel,
            HealthResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "analysis", description = "Repository grading"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the Repograde server.
pub struct ApiDoc;
