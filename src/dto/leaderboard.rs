use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::LeaderboardEntryEntity;

/// Query string of the leaderboard endpoint.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Number of entries to return (defaults to the configured size).
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

/// One ranked player.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    /// Player name.
    pub name: String,
    /// Reference of the player photo, servable under `/uploads`.
    pub photo_ref: Option<String>,
    /// Highest score the player recorded.
    pub best_score: i64,
}

/// Players ordered by best score, highest first; ties by registration order.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Ranked rows, best first.
    pub entries: Vec<LeaderboardEntry>,
}

impl From<Vec<LeaderboardEntryEntity>> for LeaderboardResponse {
    fn from(value: Vec<LeaderboardEntryEntity>) -> Self {
        let entries = value
            .into_iter()
            .enumerate()
            .map(|(index, entry)| LeaderboardEntry {
                rank: index + 1,
                name: entry.name,
                photo_ref: entry.photo_ref,
                best_score: entry.best_score,
            })
            .collect();
        Self { entries }
    }
}
