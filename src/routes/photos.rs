use axum::{
    Router,
    extract::{Path, State},
    response::Response,
    routing::get,
};

use crate::{
    error::AppError, routes::session::photo_response, services::onboarding_service,
    state::SharedState,
};

/// Serves stored player photos, e.g. for leaderboard avatars.
pub fn router() -> Router<SharedState> {
    Router::new().route("/uploads/{file_name}", get(get_photo))
}

#[utoipa::path(
    get,
    path = "/uploads/{file_name}",
    tag = "photos",
    params(("file_name" = String, Path, description = "Stored file name from a `photo_ref`")),
    responses(
        (status = 200, description = "Photo bytes", content_type = "image/*"),
        (status = 404, description = "Unknown photo")
    )
)]
/// Return a stored photo by file name.
pub async fn get_photo(
    State(state): State<SharedState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let photo = onboarding_service::stored_photo(&state, &file_name).await?;
    Ok(photo_response(photo))
}
