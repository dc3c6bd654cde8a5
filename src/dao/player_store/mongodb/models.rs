use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::{LeaderboardEntryEntity, PlayerEntity, ScoreEventEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            photo_ref: value.photo_ref,
        }
    }
}

impl From<MongoPlayerDocument> for PlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            photo_ref: value.photo_ref,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub player_id: i64,
    pub score: i64,
    pub recorded_at: DateTime,
}

impl From<ScoreEventEntity> for MongoScoreDocument {
    fn from(value: ScoreEventEntity) -> Self {
        Self {
            id: value.id,
            player_id: value.player_id,
            score: value.score,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

/// Monotonic counter backing integer identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounterDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i64,
}

/// Output row of the leaderboard aggregation pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoLeaderboardRow {
    #[serde(rename = "_id")]
    pub player_id: i64,
    pub best_score: i64,
    pub player: MongoPlayerDocument,
}

impl From<MongoLeaderboardRow> for LeaderboardEntryEntity {
    fn from(value: MongoLeaderboardRow) -> Self {
        Self {
            player_id: value.player_id,
            name: value.player.name,
            photo_ref: value.player.photo_ref,
            best_score: value.best_score,
        }
    }
}
