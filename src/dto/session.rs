//! Payloads for the onboarding flow: name submission, photo capture and session status.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::PlayerEntity,
    dto::validation::validate_player_name,
    state::SessionState,
};

/// Name typed by the visitor on the login screen.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitNameRequest {
    /// Exact player name; case and spaces are significant.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
}

/// Multipart form accepted by the photo capture endpoint (documentation only).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct PhotoUploadForm {
    /// Image file; its extension must be on the configured whitelist.
    #[schema(value_type = String, format = Binary)]
    pub photo: Vec<u8>,
}

/// Public view of a registered player.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct PlayerSummary {
    /// Player id.
    pub id: i64,
    /// Player name.
    pub name: String,
    /// Reference of the photo captured at registration.
    pub photo_ref: Option<String>,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            photo_ref: value.photo_ref,
        }
    }
}

/// Onboarding status of the calling visitor.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionResponse {
    /// No name submitted yet.
    Anonymous,
    /// A photo must be uploaded to register `name`.
    PendingPhoto {
        /// Name waiting for a photo.
        name: String,
    },
    /// Session acts as the given player.
    Authenticated {
        /// Player the session acts as.
        player_id: i64,
        /// Photo of that player.
        photo_ref: Option<String>,
    },
}

impl From<&SessionState> for SessionResponse {
    fn from(value: &SessionState) -> Self {
        match value {
            SessionState::Anonymous => SessionResponse::Anonymous,
            SessionState::PendingPhoto { proposed_name } => SessionResponse::PendingPhoto {
                name: proposed_name.clone(),
            },
            SessionState::Authenticated {
                player_id,
                photo_ref,
            } => SessionResponse::Authenticated {
                player_id: *player_id,
                photo_ref: photo_ref.clone(),
            },
        }
    }
}

/// Result of a photo upload.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhotoUploadResponse {
    /// The name was registered with the uploaded photo.
    Registered {
        /// Newly created player.
        player: PlayerSummary,
    },
    /// Someone registered the name first; the session now acts as that player and the
    /// uploaded photo was kept under `orphaned_photo_ref`.
    NameTaken {
        /// Player who owns the name.
        player: PlayerSummary,
        /// Stored upload that no player references.
        orphaned_photo_ref: String,
    },
}
