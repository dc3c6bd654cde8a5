//! Score ledger writes for authenticated sessions.

use serde_json::Value;
use tracing::info;

use crate::{
    dto::score::ScoreRecordedResponse,
    error::ServiceError,
    state::{SessionId, SharedState},
};

/// Append a score for the player bound to the session.
///
/// The session is checked before the payload, so anonymous callers always get
/// [`ServiceError::Unauthorized`]. Any integer is accepted, including zero and negatives.
pub async fn record(
    state: &SharedState,
    session_id: SessionId,
    raw_score: Option<&Value>,
) -> Result<ScoreRecordedResponse, ServiceError> {
    let player_id = state
        .sessions()
        .load(session_id)
        .player_id()
        .ok_or_else(|| {
            ServiceError::Unauthorized("a registered player is required to record scores".into())
        })?;

    let score = parse_score(raw_score)?;

    let store = state.require_player_store().await?;
    let event = store.append_score(player_id, score).await?;
    info!(%session_id, player_id, score, event_id = event.id, "score recorded");

    Ok(event.into())
}

/// Extract an integer score from the loosely typed payload value.
pub fn parse_score(raw: Option<&Value>) -> Result<i64, ServiceError> {
    match raw {
        None | Some(Value::Null) => Err(ServiceError::InvalidScore("score is required".into())),
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| ServiceError::InvalidScore(format!("`{number}` is not an integer"))),
        Some(other) => Err(ServiceError::InvalidScore(format!(
            "expected an integer, got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            photo_store::FsPhotoStore,
            player_store::{PlayerStore, memory::MemoryPlayerStore},
        },
        state::{AppState, SessionState},
    };

    async fn test_state() -> (SharedState, MemoryPlayerStore) {
        let root = std::env::temp_dir().join(format!("arcade-scores-{}", Uuid::new_v4()));
        let store = MemoryPlayerStore::new();
        let state = AppState::with_player_store(
            AppConfig::default().with_upload_dir(&root),
            Arc::new(FsPhotoStore::open(&root).await.unwrap()),
            Arc::new(store.clone()),
        )
        .await;
        (state, store)
    }

    async fn authenticated_session(state: &SharedState, store: &MemoryPlayerStore) -> SessionId {
        let player = store.create("alice".into(), None).await.unwrap();
        let (session, _) = state.sessions().open(None);
        state.sessions().store(
            session,
            SessionState::Authenticated {
                player_id: player.id,
                photo_ref: None,
            },
        );
        session
    }

    #[test]
    fn parse_score_accepts_any_integer() {
        assert_eq!(parse_score(Some(&json!(42))).unwrap(), 42);
        assert_eq!(parse_score(Some(&json!(0))).unwrap(), 0);
        assert_eq!(parse_score(Some(&json!(-7))).unwrap(), -7);
    }

    #[test]
    fn parse_score_rejects_missing_and_non_integers() {
        for raw in [
            None,
            Some(json!(null)),
            Some(json!(4.5)),
            Some(json!("42")),
            Some(json!(true)),
            Some(json!([1])),
            Some(json!(u64::MAX)),
        ] {
            let err = parse_score(raw.as_ref()).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidScore(_)), "{raw:?}");
        }
    }

    #[tokio::test]
    async fn record_appends_for_authenticated_player() {
        let (state, store) = test_state().await;
        let session = authenticated_session(&state, &store).await;

        let recorded = record(&state, session, Some(&json!(42))).await.unwrap();
        assert_eq!(recorded.score, 42);
        assert_eq!(store.score_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn record_is_unauthorized_before_authentication() {
        let (state, store) = test_state().await;
        let (anonymous, _) = state.sessions().open(None);
        let (pending, _) = state.sessions().open(None);
        state.sessions().store(
            pending,
            SessionState::PendingPhoto {
                proposed_name: "bob".into(),
            },
        );

        for session in [anonymous, pending] {
            let err = record(&state, session, Some(&json!(10))).await.unwrap_err();
            assert!(matches!(err, ServiceError::Unauthorized(_)));
        }
        assert_eq!(store.score_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unauthorized_takes_precedence_over_invalid_score() {
        let (state, _) = test_state().await;
        let (anonymous, _) = state.sessions().open(None);

        let err = record(&state, anonymous, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn omitted_score_leaves_ledger_unchanged() {
        let (state, store) = test_state().await;
        let session = authenticated_session(&state, &store).await;

        let err = record(&state, session, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidScore(_)));
        assert_eq!(store.score_count().await.unwrap(), 0);
    }
}
