use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::state::onboarding::SessionState;

/// Opaque per-visitor session identifier handed to clients.
pub type SessionId = Uuid;

struct SessionEntry {
    state: SessionState,
    last_seen: Instant,
}

/// Registry of visitor sessions, expiring entries after a period of inactivity.
///
/// Each session is only ever touched by its own visitor, so entries need no cross-session
/// locking beyond the map's sharding.
pub struct SessionRegistry {
    entries: DashMap<SessionId, SessionEntry>,
    ttl: Duration,
}

impl SessionRegistry {
    /// Create an empty registry whose sessions live `ttl` past their last use.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Resume `requested` if it is still live, otherwise open a new anonymous session.
    ///
    /// Returns the id to use and whether it was freshly issued.
    pub fn open(&self, requested: Option<SessionId>) -> (SessionId, bool) {
        if let Some(id) = requested {
            if let Some(mut entry) = self.entries.get_mut(&id) {
                if entry.last_seen.elapsed() < self.ttl {
                    entry.last_seen = Instant::now();
                    return (id, false);
                }
            }
            // Expired or unknown: forget it.
            self.entries.remove(&id);
        }

        let pruned = self.prune_expired();
        if pruned > 0 {
            debug!(pruned, "pruned expired sessions");
        }

        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            SessionEntry {
                state: SessionState::Anonymous,
                last_seen: Instant::now(),
            },
        );
        (id, true)
    }

    /// Current state of a session; unknown or expired sessions read as anonymous.
    pub fn load(&self, id: SessionId) -> SessionState {
        match self.entries.get(&id) {
            Some(entry) if entry.last_seen.elapsed() < self.ttl => entry.state.clone(),
            _ => SessionState::Anonymous,
        }
    }

    /// Replace the state held for a session.
    pub fn store(&self, id: SessionId, state: SessionState) {
        self.entries.insert(
            id,
            SessionEntry {
                state,
                last_seen: Instant::now(),
            },
        );
    }

    /// Drop a session entirely.
    pub fn clear(&self, id: SessionId) {
        self.entries.remove(&id);
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn prune_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_seen.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of sessions currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no session is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_issues_new_anonymous_session() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (id, fresh) = registry.open(None);

        assert!(fresh);
        assert_eq!(registry.load(id), SessionState::Anonymous);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn open_resumes_live_session() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (id, _) = registry.open(None);
        registry.store(
            id,
            SessionState::PendingPhoto {
                proposed_name: "alice".into(),
            },
        );

        let (resumed, fresh) = registry.open(Some(id));
        assert_eq!(resumed, id);
        assert!(!fresh);
        assert!(matches!(registry.load(id), SessionState::PendingPhoto { .. }));
    }

    #[test]
    fn unknown_session_id_is_replaced() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let stale = Uuid::new_v4();

        let (id, fresh) = registry.open(Some(stale));
        assert!(fresh);
        assert_ne!(id, stale);
    }

    #[test]
    fn expired_sessions_read_as_anonymous() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let id = Uuid::new_v4();
        registry.store(
            id,
            SessionState::Authenticated {
                player_id: 1,
                photo_ref: None,
            },
        );

        assert_eq!(registry.load(id), SessionState::Anonymous);
        assert_eq!(registry.prune_expired(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_discards_pending_data() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (id, _) = registry.open(None);
        registry.store(
            id,
            SessionState::PendingPhoto {
                proposed_name: "bob".into(),
            },
        );

        registry.clear(id);
        assert_eq!(registry.load(id), SessionState::Anonymous);
    }
}
