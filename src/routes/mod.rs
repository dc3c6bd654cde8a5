use axum::{Router, middleware};

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// `/healthcheck`.
pub mod health;
/// `/leaderboard`.
pub mod leaderboard;
/// `/uploads/{file_name}`.
pub mod photos;
/// `/scores`.
pub mod scores;
/// `/session/*` and the session cookie middleware.
pub mod session;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let visitor_router = session::router(&state)
        .merge(scores::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::attach_session,
        ));

    let api_router = health::router()
        .merge(leaderboard::router())
        .merge(photos::router())
        .merge(visitor_router);

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
