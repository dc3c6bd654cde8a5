use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{dao::models::ScoreEventEntity, dto::format_system_time};

/// Score reported by the game client at the end of a round.
///
/// Kept loosely typed so missing or non-integer values surface as an invalid score rather
/// than a generic body rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitScoreRequest {
    /// Integer score.
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub score: Option<Value>,
}

/// Acknowledgement of a recorded score.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreRecordedResponse {
    /// Ledger id of the event.
    pub id: i64,
    /// Score as recorded.
    pub score: i64,
    /// RFC 3339 timestamp.
    pub recorded_at: String,
}

impl From<ScoreEventEntity> for ScoreRecordedResponse {
    fn from(value: ScoreEventEntity) -> Self {
        Self {
            id: value.id,
            score: value.score,
            recorded_at: format_system_time(value.recorded_at),
        }
    }
}
