/// Onboarding state machine.
pub mod onboarding;
/// Visitor session registry.
pub mod session;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{photo_store::PhotoStore, player_store::PlayerStore},
    error::ServiceError,
};

pub use self::onboarding::{InvalidTransition, OnboardingEvent, SessionState};
pub use self::session::{SessionId, SessionRegistry};

/// Handle to the application state shared by every handler.
pub type SharedState = Arc<AppState>;

/// Central application state: injected store handles, visitor sessions and configuration.
pub struct AppState {
    player_store: RwLock<Option<Arc<dyn PlayerStore>>>,
    photo_store: Arc<dyn PhotoStore>,
    sessions: SessionRegistry,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a player store is installed.
    pub fn new(config: AppConfig, photo_store: Arc<dyn PhotoStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            player_store: RwLock::new(None),
            photo_store,
            sessions: SessionRegistry::new(config.session_ttl()),
            config,
            degraded: degraded_tx,
        })
    }

    /// Construct a state with a player store already installed.
    pub async fn with_player_store(
        config: AppConfig,
        photo_store: Arc<dyn PhotoStore>,
        player_store: Arc<dyn PlayerStore>,
    ) -> SharedState {
        let state = Self::new(config, photo_store);
        state.set_player_store(player_store).await;
        state
    }

    /// Obtain a handle to the current player store, if one is installed.
    pub async fn player_store(&self) -> Option<Arc<dyn PlayerStore>> {
        let guard = self.player_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the player store or fail with [`ServiceError::Degraded`].
    pub async fn require_player_store(&self) -> Result<Arc<dyn PlayerStore>, ServiceError> {
        self.player_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new player store implementation and leave degraded mode.
    pub async fn set_player_store(&self, store: Arc<dyn PlayerStore>) {
        {
            let mut guard = self.player_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current player store and enter degraded mode.
    pub async fn clear_player_store(&self) {
        {
            let mut guard = self.player_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Photo storage backend.
    pub fn photo_store(&self) -> &Arc<dyn PhotoStore> {
        &self.photo_store
    }

    /// Visitor session registry.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        if self.player_store.read().await.is_none() {
            return true;
        }
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
