use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of score events in the ledger, when the store answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_events: Option<u64>,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(score_events: Option<u64>) -> Self {
        Self {
            status: "ok".to_string(),
            score_events,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            score_events: None,
        }
    }
}
