//! Read-only leaderboard projection.

use crate::{dto::leaderboard::LeaderboardResponse, error::ServiceError, state::SharedState};

/// Return the best score of each player, highest first.
///
/// `limit` falls back to the configured leaderboard size. Players without scores are not
/// listed; equal scores are ordered by player id.
pub async fn top(
    state: &SharedState,
    limit: Option<usize>,
) -> Result<LeaderboardResponse, ServiceError> {
    let limit = limit.unwrap_or_else(|| state.config().leaderboard_size());
    if limit == 0 {
        return Err(ServiceError::InvalidInput(
            "leaderboard limit must be positive".into(),
        ));
    }

    let store = state.require_player_store().await?;
    let entries = store.top_scores(limit).await?;
    Ok(entries.into())
}
