use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the player store and report its status along with the ledger size.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = match state.require_player_store().await {
        Ok(store) => store,
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            return HealthResponse::degraded();
        }
    };

    if let Err(err) = store.health_check().await {
        warn!(error = %err, "storage health check failed");
    }

    if state.is_degraded().await {
        return HealthResponse::degraded();
    }

    let score_events = match store.score_count().await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(error = %err, "failed to count score events");
            None
        }
    };
    HealthResponse::ok(score_events)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            photo_store::FsPhotoStore,
            player_store::{PlayerStore, memory::MemoryPlayerStore},
        },
        state::AppState,
    };

    async fn photos() -> Arc<FsPhotoStore> {
        let root = std::env::temp_dir().join(format!("arcade-health-{}", Uuid::new_v4()));
        Arc::new(FsPhotoStore::open(&root).await.unwrap())
    }

    #[tokio::test]
    async fn healthy_store_reports_ledger_size() {
        let store = MemoryPlayerStore::new();
        let player = store.create("alice".into(), None).await.unwrap();
        store.append_score(player.id, 3).await.unwrap();
        store.append_score(player.id, 7).await.unwrap();
        let state =
            AppState::with_player_store(AppConfig::default(), photos().await, Arc::new(store))
                .await;

        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.score_events, Some(2));
    }

    #[tokio::test]
    async fn missing_store_reports_degraded() {
        let state = AppState::new(AppConfig::default(), photos().await);

        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.score_events, None);
    }
}
