use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Identity record for a player, keyed by a unique name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Immutable identifier assigned at creation.
    pub id: i64,
    /// Exact, case-sensitive display name. Unique across players.
    pub name: String,
    /// Reference to the photo captured at registration, if any.
    pub photo_ref: Option<String>,
}

/// One recorded game result. Never updated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEventEntity {
    /// Ledger-wide identifier of the event.
    pub id: i64,
    /// Player the score belongs to.
    pub player_id: i64,
    /// Raw score reported by the game client.
    pub score: i64,
    /// When the event was appended.
    pub recorded_at: SystemTime,
}

/// Aggregated leaderboard row: a player joined with their best score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntryEntity {
    /// Ranked player.
    pub player_id: i64,
    /// Player name.
    pub name: String,
    /// Player photo, if any.
    pub photo_ref: Option<String>,
    /// Highest score in the player's ledger.
    pub best_score: i64,
}

impl LeaderboardEntryEntity {
    /// Join a player with the best score computed for them.
    pub fn from_player(player: PlayerEntity, best_score: i64) -> Self {
        Self {
            player_id: player.id,
            name: player.name,
            photo_ref: player.photo_ref,
            best_score,
        }
    }
}
