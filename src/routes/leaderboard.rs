use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use axum_valid::{Valid, ValidRejection};

use crate::{
    dto::leaderboard::{LeaderboardQuery, LeaderboardResponse},
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Public read-only ranking.
pub fn router() -> Router<SharedState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Players ranked by best score", body = LeaderboardResponse),
        (status = 400, description = "Limit out of range")
    )
)]
/// Return the top players ranked by their best score.
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    query: Result<Valid<Query<LeaderboardQuery>>, ValidRejection<QueryRejection>>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let Valid(Query(query)) = query?;
    let payload = leaderboard_service::top(&state, query.limit).await?;
    Ok(Json(payload))
}
