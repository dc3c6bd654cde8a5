use thiserror::Error;

use crate::dao::models::PlayerEntity;

/// Per-visitor onboarding state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing known about the visitor yet.
    #[default]
    Anonymous,
    /// The visitor chose a name nobody owns; a photo is required to register it.
    PendingPhoto {
        /// Name that will be registered once the photo is accepted.
        proposed_name: String,
    },
    /// The visitor is bound to an existing player. Only this state may record scores.
    Authenticated {
        /// Player the session acts as.
        player_id: i64,
        /// Photo of that player, if one was captured.
        photo_ref: Option<String>,
    },
}

impl SessionState {
    /// Player bound to the session, when authenticated.
    pub fn player_id(&self) -> Option<i64> {
        match self {
            SessionState::Authenticated { player_id, .. } => Some(*player_id),
            _ => None,
        }
    }

    /// Apply an onboarding event, returning the next state.
    pub fn transition(&self, event: OnboardingEvent) -> Result<SessionState, InvalidTransition> {
        let next = match (self, event) {
            (_, OnboardingEvent::Logout) => SessionState::Anonymous,
            (SessionState::Anonymous, OnboardingEvent::NameRecognized(player)) => {
                authenticated(player)
            }
            (SessionState::Anonymous, OnboardingEvent::NameUnknown(name)) => {
                SessionState::PendingPhoto {
                    proposed_name: name,
                }
            }
            (SessionState::PendingPhoto { proposed_name }, OnboardingEvent::PhotoRegistered(player))
                if *proposed_name == player.name =>
            {
                authenticated(player)
            }
            // Another session registered the name first; adopt the existing player.
            (SessionState::PendingPhoto { proposed_name }, OnboardingEvent::NameRecognized(player))
                if *proposed_name == player.name =>
            {
                authenticated(player)
            }
            (from, event) => {
                return Err(InvalidTransition {
                    from: from.clone(),
                    event,
                });
            }
        };

        Ok(next)
    }
}

fn authenticated(player: PlayerEntity) -> SessionState {
    SessionState::Authenticated {
        player_id: player.id,
        photo_ref: player.photo_ref,
    }
}

/// Events driving the onboarding flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingEvent {
    /// The submitted name belongs to an existing player.
    NameRecognized(PlayerEntity),
    /// The submitted name is free.
    NameUnknown(String),
    /// The photo was stored and the player created.
    PhotoRegistered(PlayerEntity),
    /// Drop whatever the session held.
    Logout,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The state the session was in when the invalid event was received.
    pub from: SessionState,
    /// The event that cannot be applied from this state.
    pub event: OnboardingEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: i64, name: &str, photo_ref: Option<&str>) -> PlayerEntity {
        PlayerEntity {
            id,
            name: name.into(),
            photo_ref: photo_ref.map(Into::into),
        }
    }

    #[test]
    fn initial_state_is_anonymous() {
        assert_eq!(SessionState::default(), SessionState::Anonymous);
        assert_eq!(SessionState::default().player_id(), None);
    }

    #[test]
    fn new_name_goes_through_photo_capture() {
        let pending = SessionState::Anonymous
            .transition(OnboardingEvent::NameUnknown("alice".into()))
            .unwrap();
        assert_eq!(
            pending,
            SessionState::PendingPhoto {
                proposed_name: "alice".into()
            }
        );

        let done = pending
            .transition(OnboardingEvent::PhotoRegistered(player(
                1,
                "alice",
                Some("uploads/a.png"),
            )))
            .unwrap();
        assert_eq!(
            done,
            SessionState::Authenticated {
                player_id: 1,
                photo_ref: Some("uploads/a.png".into())
            }
        );
        assert_eq!(done.player_id(), Some(1));
    }

    #[test]
    fn known_name_skips_photo_capture() {
        let next = SessionState::Anonymous
            .transition(OnboardingEvent::NameRecognized(player(7, "bob", None)))
            .unwrap();
        assert_eq!(
            next,
            SessionState::Authenticated {
                player_id: 7,
                photo_ref: None
            }
        );
    }

    #[test]
    fn race_fallback_adopts_existing_player() {
        let pending = SessionState::PendingPhoto {
            proposed_name: "carol".into(),
        };
        let next = pending
            .transition(OnboardingEvent::NameRecognized(player(
                3,
                "carol",
                Some("uploads/c.png"),
            )))
            .unwrap();
        assert_eq!(next.player_id(), Some(3));
    }

    #[test]
    fn photo_for_another_name_is_rejected() {
        let pending = SessionState::PendingPhoto {
            proposed_name: "dave".into(),
        };
        let err = pending
            .transition(OnboardingEvent::PhotoRegistered(player(4, "eve", None)))
            .unwrap_err();
        assert_eq!(err.from, pending);
    }

    #[test]
    fn photo_without_pending_name_is_rejected() {
        let err = SessionState::Anonymous
            .transition(OnboardingEvent::PhotoRegistered(player(1, "alice", None)))
            .unwrap_err();
        assert_eq!(err.from, SessionState::Anonymous);

        let authenticated = SessionState::Authenticated {
            player_id: 1,
            photo_ref: None,
        };
        assert!(
            authenticated
                .transition(OnboardingEvent::NameUnknown("zed".into()))
                .is_err()
        );
    }

    #[test]
    fn logout_resets_every_state() {
        let states = [
            SessionState::Anonymous,
            SessionState::PendingPhoto {
                proposed_name: "frank".into(),
            },
            SessionState::Authenticated {
                player_id: 9,
                photo_ref: None,
            },
        ];

        for state in states {
            assert_eq!(
                state.transition(OnboardingEvent::Logout).unwrap(),
                SessionState::Anonymous
            );
        }
    }
}
