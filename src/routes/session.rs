use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, State, multipart::MultipartError, rejection::JsonRejection,
    },
    http::{
        HeaderMap, HeaderValue, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_valid::{Valid, ValidRejection};
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::session::{PhotoUploadForm, PhotoUploadResponse, SessionResponse, SubmitNameRequest},
    error::AppError,
    services::onboarding_service::{self, PhotoContent},
    state::{SessionId, SharedState},
};

/// Cookie carrying the opaque visitor session identifier.
pub const SESSION_COOKIE: &str = "arcade_session";
/// Multipart field holding the uploaded photo.
const PHOTO_FIELD: &str = "photo";
/// Room left for multipart framing on top of the photo size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Session bound to the current request by [`attach_session`].
#[derive(Debug, Clone, Copy)]
pub struct VisitorSession(pub SessionId);

/// Onboarding endpoints acting on the caller's session.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let upload_limit = state.config().max_photo_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/session", get(get_session))
        .route("/session/name", post(submit_name))
        .route(
            "/session/photo",
            get(get_session_photo)
                .post(submit_photo)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/session/logout", post(logout))
}

/// Resolve (or issue) the visitor session and expose it to handlers as [`VisitorSession`].
pub async fn attach_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let requested = session_cookie(req.headers());
    let (session_id, fresh) = state.sessions().open(requested);
    req.extensions_mut().insert(VisitorSession(session_id));

    let mut response = next.run(req).await;
    if fresh {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => warn!(error = %err, "failed to encode session cookie"),
        }
    }
    response
}

fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Onboarding status of the caller", body = SessionResponse))
)]
/// Return where the caller stands in the onboarding flow.
pub async fn get_session(
    State(state): State<SharedState>,
    Extension(VisitorSession(session_id)): Extension<VisitorSession>,
) -> Json<SessionResponse> {
    Json(onboarding_service::session_status(&state, session_id))
}

#[utoipa::path(
    post,
    path = "/session/name",
    tag = "session",
    request_body = SubmitNameRequest,
    responses(
        (status = 200, description = "Player recognized or photo required", body = SessionResponse),
        (status = 400, description = "Invalid name")
    )
)]
/// Submit a player name; known names are signed in, new names must upload a photo.
pub async fn submit_name(
    State(state): State<SharedState>,
    Extension(VisitorSession(session_id)): Extension<VisitorSession>,
    payload: Result<Valid<Json<SubmitNameRequest>>, ValidRejection<JsonRejection>>,
) -> Result<Json<SessionResponse>, AppError> {
    let Valid(Json(payload)) = payload?;
    let response = onboarding_service::submit_name(&state, session_id, payload.name).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/session/photo",
    tag = "session",
    request_body(content = PhotoUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Player registered, or name taken meanwhile", body = PhotoUploadResponse),
        (status = 401, description = "No name pending registration"),
        (status = 413, description = "Photo too large"),
        (status = 415, description = "File extension not allowed")
    )
)]
/// Upload the photo completing a new player's registration.
pub async fn submit_photo(
    State(state): State<SharedState>,
    Extension(VisitorSession(session_id)): Extension<VisitorSession>,
    mut multipart: Multipart,
) -> Result<Json<PhotoUploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let response =
            onboarding_service::submit_photo(&state, session_id, &filename, bytes).await?;
        return Ok(Json(response));
    }

    Err(AppError::BadRequest(format!(
        "missing multipart field `{PHOTO_FIELD}`"
    )))
}

#[utoipa::path(
    get,
    path = "/session/photo",
    tag = "session",
    responses(
        (status = 200, description = "Photo of the signed-in player", content_type = "image/*"),
        (status = 401, description = "No player bound to the session"),
        (status = 404, description = "Player has no photo")
    )
)]
/// Return the photo of the player bound to the caller's session.
pub async fn get_session_photo(
    State(state): State<SharedState>,
    Extension(VisitorSession(session_id)): Extension<VisitorSession>,
) -> Result<Response, AppError> {
    let photo = onboarding_service::current_photo(&state, session_id).await?;
    Ok(photo_response(photo))
}

#[utoipa::path(
    post,
    path = "/session/logout",
    tag = "session",
    responses((status = 204, description = "Session cleared"))
)]
/// Clear the caller's session, discarding any pending registration.
pub async fn logout(
    State(state): State<SharedState>,
    Extension(VisitorSession(session_id)): Extension<VisitorSession>,
) -> StatusCode {
    onboarding_service::logout(&state, session_id);
    StatusCode::NO_CONTENT
}

/// Serve photo bytes with their MIME type.
pub fn photo_response(photo: PhotoContent) -> Response {
    ([(CONTENT_TYPE, photo.content_type)], photo.bytes).into_response()
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_found_among_others() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; lang=en")).unwrap(),
        );

        assert_eq!(session_cookie(&headers), Some(id));
    }

    #[test]
    fn malformed_or_missing_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);

        headers.insert(
            COOKIE,
            HeaderValue::from_static("arcade_session=not-a-uuid"),
        );
        assert_eq!(session_cookie(&headers), None);
    }
}
