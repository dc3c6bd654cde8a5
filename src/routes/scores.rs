use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use tracing::debug;

use crate::{
    dto::score::{ScoreRecordedResponse, SubmitScoreRequest},
    error::AppError,
    routes::session::VisitorSession,
    services::score_service,
    state::SharedState,
};

/// Score submission endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/scores", post(submit_score))
}

#[utoipa::path(
    post,
    path = "/scores",
    tag = "scores",
    request_body = SubmitScoreRequest,
    responses(
        (status = 201, description = "Score appended to the ledger", body = ScoreRecordedResponse),
        (status = 400, description = "Score missing or not an integer"),
        (status = 401, description = "Session is not bound to a player")
    )
)]
/// Record the score of a finished round for the signed-in player.
pub async fn submit_score(
    State(state): State<SharedState>,
    Extension(VisitorSession(session_id)): Extension<VisitorSession>,
    payload: Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScoreRecordedResponse>), AppError> {
    // Body problems are reported as an invalid score, after the session check.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(%session_id, error = %rejection.body_text(), "unreadable score payload");
            SubmitScoreRequest::default()
        }
    };

    let recorded = score_service::record(&state, session_id, request.score.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}
