use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    core::{ClaimError, ClaimResult, GridSnapshot, Identity, SequencedBlock},
    services::GridUpdate,
};

/// Result of a claim request: `{ok}` or `{ok: false, reason: "owned", ownerId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl From<&ClaimResult> for ClaimResponse {
    fn from(result: &ClaimResult) -> Self {
        match result {
            ClaimResult::Claimed(_) => Self {
                ok: true,
                reason: None,
                owner_id: None,
            },
            ClaimResult::AlreadyOwned { owner_id } => Self {
                ok: false,
                reason: Some("owned".to_string()),
                owner_id: Some(owner_id.clone()),
            },
        }
    }
}

/// Error body shared by HTTP and WebSocket replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

impl From<&ClaimError> for ErrorResponse {
    fn from(err: &ClaimError) -> Self {
        Self {
            error: err.code().to_string(),
            detail: err.to_string(),
        }
    }
}

impl ClaimError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClaimError::InvalidCoordinate(_) => StatusCode::BAD_REQUEST,
            ClaimError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ClaimError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ClaimError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Issued guest session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Signed identity token, also set as the session cookie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub owner_id: String,
    pub owner_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_avatar: Option<String>,
}

impl SessionResponse {
    pub fn from_identity(identity: &Identity, token: Option<String>) -> Self {
        Self {
            token,
            owner_id: identity.id.clone(),
            owner_name: identity.display_name.clone(),
            owner_avatar: identity.avatar_uri.clone(),
        }
    }
}

/// Grid occupancy statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub rows: u32,
    pub cols: u32,
    pub claimed: usize,
    pub total: usize,
    pub subscribers: usize,
}

/// Messages pushed to WebSocket clients
///
/// Every block in `blocks_claimed` carries its `seq`. Clients drop blocks
/// with `seq` at or below the last snapshot's `seq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot(GridSnapshot),
    BlocksClaimed { blocks: Vec<SequencedBlock> },
    ClaimResult(ClaimResponse),
    Error(ErrorResponse),
}

impl From<GridUpdate> for ServerMessage {
    fn from(update: GridUpdate) -> Self {
        match update {
            GridUpdate::Snapshot(snapshot) => ServerMessage::Snapshot(snapshot),
            GridUpdate::BlocksClaimed(blocks) => ServerMessage::BlocksClaimed { blocks },
        }
    }
}
