//! OpenAPI document served by Swagger UI and dumped by `openapi-generator`.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Arcade Board Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::get_session,
        crate::routes::session::submit_name,
        crate::routes::session::submit_photo,
        crate::routes::session::get_session_photo,
        crate::routes::session::logout,
        crate::routes::scores::submit_score,
        crate::routes::leaderboard::get_leaderboard,
        crate::routes::photos::get_photo,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::SubmitNameRequest,
            crate::dto::session::PhotoUploadForm,
            crate::dto::session::PlayerSummary,
            crate::dto::session::SessionResponse,
            crate::dto::session::PhotoUploadResponse,
            crate::dto::score::SubmitScoreRequest,
            crate::dto::score::ScoreRecordedResponse,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::leaderboard::LeaderboardResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Onboarding by name and photo"),
        (name = "scores", description = "Score submission"),
        (name = "leaderboard", description = "Best scores ranking"),
        (name = "photos", description = "Stored player photos"),
    )
)]
pub struct ApiDoc;
