//! Onboarding flow: name submission, photo capture and session photo retrieval.

use axum::body::Bytes;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        photo_store::{content_type_for, generate_photo_name, photo_ref_for},
        storage::StorageError,
    },
    dto::session::{PhotoUploadResponse, SessionResponse},
    error::ServiceError,
    state::{OnboardingEvent, SessionId, SessionState, SharedState},
};

/// Photo bytes together with the MIME type to serve them with.
#[derive(Debug)]
pub struct PhotoContent {
    /// MIME type derived from the file extension.
    pub content_type: &'static str,
    /// Raw file contents.
    pub bytes: Bytes,
}

/// Report the onboarding status of a session.
pub fn session_status(state: &SharedState, session_id: SessionId) -> SessionResponse {
    (&state.sessions().load(session_id)).into()
}

/// Resolve a submitted name: known players are authenticated directly, unknown names wait
/// for a photo.
///
/// Recognition is by name alone; whoever types an existing name acts as that player.
pub async fn submit_name(
    state: &SharedState,
    session_id: SessionId,
    name: String,
) -> Result<SessionResponse, ServiceError> {
    let mut current = state.sessions().load(session_id);
    if current != SessionState::Anonymous {
        debug!(%session_id, "name submitted on an active session; restarting onboarding");
        current = current.transition(OnboardingEvent::Logout)?;
    }

    let store = state.require_player_store().await?;
    let event = match store.resolve(name.clone()).await? {
        Some(player) => {
            info!(%session_id, player_id = player.id, "returning player recognized");
            OnboardingEvent::NameRecognized(player)
        }
        None => {
            info!(%session_id, name = %name, "new player; awaiting photo");
            OnboardingEvent::NameUnknown(name)
        }
    };

    let next = current.transition(event)?;
    state.sessions().store(session_id, next.clone());
    Ok((&next).into())
}

/// Register the pending name with the uploaded photo.
///
/// When another session registered the same name in the meantime, the session falls back to
/// that player and the freshly stored photo is reported as orphaned instead of being dropped.
pub async fn submit_photo(
    state: &SharedState,
    session_id: SessionId,
    filename: &str,
    bytes: Bytes,
) -> Result<PhotoUploadResponse, ServiceError> {
    let current = state.sessions().load(session_id);
    let SessionState::PendingPhoto { proposed_name } = &current else {
        return Err(ServiceError::Unauthorized(
            "submit a name before uploading a photo".into(),
        ));
    };
    let name = proposed_name.clone();

    let extension = state
        .config()
        .allowed_extension(filename)
        .ok_or_else(|| {
            ServiceError::UnsupportedFormat(format!(
                "`{filename}` is not one of: {}",
                state.config().allowed_extensions().join(", ")
            ))
        })?;

    if bytes.is_empty() {
        return Err(ServiceError::InvalidInput("photo is empty".into()));
    }
    let limit = state.config().max_photo_bytes();
    if bytes.len() > limit {
        return Err(ServiceError::PayloadTooLarge { limit });
    }

    let store = state.require_player_store().await?;
    let photo_ref = state
        .photo_store()
        .save(bytes, generate_photo_name(&extension))
        .await?;

    match store.create(name.clone(), Some(photo_ref.clone())).await {
        Ok(player) => {
            let next = current.transition(OnboardingEvent::PhotoRegistered(player.clone()))?;
            state.sessions().store(session_id, next);
            info!(%session_id, player_id = player.id, photo_ref = %photo_ref, "player registered");
            Ok(PhotoUploadResponse::Registered {
                player: player.into(),
            })
        }
        Err(StorageError::DuplicateName { .. }) => {
            warn!(
                %session_id,
                name = %name,
                photo_ref = %photo_ref,
                "name registered concurrently; keeping uploaded photo as orphan"
            );
            let existing = store.resolve(name.clone()).await?.ok_or_else(|| {
                ServiceError::NotFound(format!("player `{name}` vanished after registration"))
            })?;
            let next = current.transition(OnboardingEvent::NameRecognized(existing.clone()))?;
            state.sessions().store(session_id, next);
            Ok(PhotoUploadResponse::NameTaken {
                player: existing.into(),
                orphaned_photo_ref: photo_ref,
            })
        }
        Err(err) => {
            warn!(%session_id, photo_ref = %photo_ref, error = %err, "player creation failed after photo upload");
            Err(err.into())
        }
    }
}

/// Photo of the player bound to the session.
pub async fn current_photo(
    state: &SharedState,
    session_id: SessionId,
) -> Result<PhotoContent, ServiceError> {
    let SessionState::Authenticated { photo_ref, .. } = state.sessions().load(session_id) else {
        return Err(ServiceError::Unauthorized(
            "no player is bound to this session".into(),
        ));
    };
    let photo_ref =
        photo_ref.ok_or_else(|| ServiceError::NotFound("player has no photo".into()))?;

    load_photo(state, photo_ref).await
}

/// Serve a stored photo by its file name.
pub async fn stored_photo(
    state: &SharedState,
    file_name: &str,
) -> Result<PhotoContent, ServiceError> {
    load_photo(state, photo_ref_for(file_name)).await
}

/// Forget everything the session held.
pub fn logout(state: &SharedState, session_id: SessionId) {
    state.sessions().clear(session_id);
    debug!(%session_id, "session cleared");
}

async fn load_photo(state: &SharedState, photo_ref: String) -> Result<PhotoContent, ServiceError> {
    let bytes = state
        .photo_store()
        .load(photo_ref.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("photo `{photo_ref}` not found")))?;

    Ok(PhotoContent {
        content_type: content_type_for(&photo_ref),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{LeaderboardEntryEntity, PlayerEntity, ScoreEventEntity},
            photo_store::FsPhotoStore,
            player_store::{PlayerStore, memory::MemoryPlayerStore},
            storage::StorageResult,
        },
        state::AppState,
    };

    async fn test_state_with(store: Arc<dyn PlayerStore>) -> SharedState {
        let root = std::env::temp_dir().join(format!("arcade-onboarding-{}", Uuid::new_v4()));
        let config = AppConfig::default().with_upload_dir(&root);
        let photos = FsPhotoStore::open(&root).await.unwrap();
        AppState::with_player_store(config, Arc::new(photos), store).await
    }

    async fn test_state() -> (SharedState, MemoryPlayerStore) {
        let store = MemoryPlayerStore::new();
        (test_state_with(Arc::new(store.clone())).await, store)
    }

    fn png() -> Bytes {
        Bytes::from_static(b"\x89PNG\r\n\x1a\n")
    }

    #[tokio::test]
    async fn unknown_name_waits_for_photo() {
        let (state, _) = test_state().await;
        let (session, _) = state.sessions().open(None);

        let response = submit_name(&state, session, "alice".into()).await.unwrap();
        assert_eq!(
            response,
            SessionResponse::PendingPhoto {
                name: "alice".into()
            }
        );
    }

    #[tokio::test]
    async fn onboarding_scenario_registers_then_recognizes() {
        let (state, store) = test_state().await;
        let (first, _) = state.sessions().open(None);

        submit_name(&state, first, "alice".into()).await.unwrap();
        let uploaded = submit_photo(&state, first, "a.jpg", png()).await.unwrap();
        let PhotoUploadResponse::Registered { player } = uploaded else {
            panic!("expected registration, got {uploaded:?}");
        };
        assert_eq!(player.name, "alice");
        let photo_ref = player.photo_ref.clone().unwrap();
        assert!(photo_ref.ends_with(".jpg"));
        assert_eq!(
            state.sessions().load(first),
            SessionState::Authenticated {
                player_id: player.id,
                photo_ref: Some(photo_ref.clone()),
            }
        );

        let (second, _) = state.sessions().open(None);
        let response = submit_name(&state, second, "alice".into()).await.unwrap();
        assert_eq!(
            response,
            SessionResponse::Authenticated {
                player_id: player.id,
                photo_ref: Some(photo_ref),
            }
        );
        assert_eq!(
            store.resolve("alice".into()).await.unwrap().map(|p| p.id),
            Some(player.id)
        );
    }

    #[tokio::test]
    async fn unsupported_extension_keeps_pending_state() {
        let (state, _) = test_state().await;
        let (session, _) = state.sessions().open(None);
        submit_name(&state, session, "bob".into()).await.unwrap();

        let err = submit_photo(&state, session, "x.exe", png()).await.unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedFormat(_)));
        assert_eq!(
            state.sessions().load(session),
            SessionState::PendingPhoto {
                proposed_name: "bob".into()
            }
        );

        let ok = submit_photo(&state, session, "x.PNG", png()).await.unwrap();
        assert!(matches!(ok, PhotoUploadResponse::Registered { .. }));
    }

    #[tokio::test]
    async fn photo_without_pending_name_is_unauthorized() {
        let (state, _) = test_state().await;
        let (session, _) = state.sessions().open(None);

        let err = submit_photo(&state, session, "a.png", png()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn empty_and_oversized_photos_are_rejected() {
        let (state, _) = test_state().await;
        let (session, _) = state.sessions().open(None);
        submit_name(&state, session, "carol".into()).await.unwrap();

        let err = submit_photo(&state, session, "a.png", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let huge = Bytes::from(vec![0u8; state.config().max_photo_bytes() + 1]);
        let err = submit_photo(&state, session, "a.png", huge).await.unwrap_err();
        assert!(matches!(err, ServiceError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn concurrent_registration_falls_back_to_existing_player() {
        let (state, store) = test_state().await;
        let (slow, _) = state.sessions().open(None);
        let (fast, _) = state.sessions().open(None);

        submit_name(&state, slow, "dave".into()).await.unwrap();
        submit_name(&state, fast, "dave".into()).await.unwrap();
        let winner = submit_photo(&state, fast, "fast.png", png()).await.unwrap();
        let PhotoUploadResponse::Registered { player: winner } = winner else {
            panic!("first upload should register");
        };

        let outcome = submit_photo(&state, slow, "slow.png", png()).await.unwrap();
        match outcome {
            PhotoUploadResponse::NameTaken {
                player,
                orphaned_photo_ref,
            } => {
                assert_eq!(player, winner);
                assert_ne!(Some(orphaned_photo_ref.clone()), winner.photo_ref);
                // The orphaned upload is still retrievable.
                assert!(
                    state
                        .photo_store()
                        .load(orphaned_photo_ref)
                        .await
                        .unwrap()
                        .is_some()
                );
            }
            other => panic!("expected fallback, got {other:?}"),
        }

        assert_eq!(state.sessions().load(slow).player_id(), Some(winner.id));
        assert_eq!(store.top_scores(10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn submitting_a_name_restarts_onboarding() {
        let (state, _) = test_state().await;
        let (session, _) = state.sessions().open(None);
        submit_name(&state, session, "erin".into()).await.unwrap();
        submit_photo(&state, session, "e.png", png()).await.unwrap();

        let response = submit_name(&state, session, "frank".into()).await.unwrap();
        assert_eq!(
            response,
            SessionResponse::PendingPhoto {
                name: "frank".into()
            }
        );
    }

    #[tokio::test]
    async fn current_photo_requires_authentication() {
        let (state, _) = test_state().await;
        let (session, _) = state.sessions().open(None);

        let err = current_photo(&state, session).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        submit_name(&state, session, "gina".into()).await.unwrap();
        submit_photo(&state, session, "g.png", png()).await.unwrap();

        let photo = current_photo(&state, session).await.unwrap();
        assert_eq!(photo.content_type, "image/png");
        assert_eq!(photo.bytes, png());
    }

    #[tokio::test]
    async fn logout_returns_to_anonymous() {
        let (state, _) = test_state().await;
        let (session, _) = state.sessions().open(None);
        submit_name(&state, session, "hank".into()).await.unwrap();

        logout(&state, session);
        assert_eq!(session_status(&state, session), SessionResponse::Anonymous);
    }

    /// Store whose `create` always loses the race against an already registered player.
    struct RacingStore {
        inner: MemoryPlayerStore,
    }

    impl PlayerStore for RacingStore {
        fn resolve(&self, name: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
            self.inner.resolve(name)
        }

        fn get(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
            self.inner.get(id)
        }

        fn create(
            &self,
            name: String,
            _photo_ref: Option<String>,
        ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
            let inner = self.inner.clone();
            Box::pin(async move {
                inner
                    .create(name.clone(), Some("uploads/winner.png".into()))
                    .await?;
                Err(StorageError::DuplicateName { name })
            })
        }

        fn append_score(
            &self,
            player_id: i64,
            score: i64,
        ) -> BoxFuture<'static, StorageResult<ScoreEventEntity>> {
            self.inner.append_score(player_id, score)
        }

        fn top_scores(
            &self,
            limit: usize,
        ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
            self.inner.top_scores(limit)
        }

        fn score_count(&self) -> BoxFuture<'static, StorageResult<u64>> {
            self.inner.score_count()
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    #[tokio::test]
    async fn race_between_resolve_and_create_is_recovered() {
        let state = test_state_with(Arc::new(RacingStore {
            inner: MemoryPlayerStore::new(),
        }))
        .await;
        let (session, _) = state.sessions().open(None);

        submit_name(&state, session, "ivy".into()).await.unwrap();
        let outcome = submit_photo(&state, session, "i.jpeg", png()).await.unwrap();

        let PhotoUploadResponse::NameTaken { player, .. } = outcome else {
            panic!("expected fallback, got {outcome:?}");
        };
        assert_eq!(player.photo_ref.as_deref(), Some("uploads/winner.png"));
        assert_eq!(
            state.sessions().load(session),
            SessionState::Authenticated {
                player_id: player.id,
                photo_ref: Some("uploads/winner.png".into()),
            }
        );
    }
}
