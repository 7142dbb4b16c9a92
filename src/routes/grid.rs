use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{
    auth::Credential,
    core::{ClaimError, GridSnapshot},
    models::{ClaimBlockRequest, ClaimResponse, StatsResponse},
    services::submit_claim,
    state::AppState,
};

/// Current grid: dimensions plus every claimed block. No auth required.
pub async fn get_grid(State(state): State<AppState>) -> Result<Json<GridSnapshot>, ClaimError> {
    Ok(Json(state.grid.snapshot()?))
}

/// Claim a block for the authenticated caller
///
/// # Returns
///
/// `{ok: true}` on a win, `{ok: false, reason: "owned", ownerId}` when the
/// block already has an owner
///
/// # Errors
///
/// - 400 `invalid_coordinate` for a missing/malformed body or bad row/col
/// - 401 `unauthenticated` without a valid credential
/// - 503 `storage_unavailable` when the claim could not be recorded
pub async fn claim_block(
    State(state): State<AppState>,
    credential: Credential,
    payload: Result<Json<ClaimBlockRequest>, JsonRejection>,
) -> Result<Json<ClaimResponse>, ClaimError> {
    let Json(request) = payload.map_err(|rejection| {
        ClaimError::InvalidCoordinate(format!("malformed claim body: {}", rejection.body_text()))
    })?;

    let result = submit_claim(
        &state.grid,
        &state.sync_hub,
        state.identity.as_ref(),
        &request.row,
        &request.col,
        credential.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::debug!("Rejected claim ({:?}, {:?}): {}", request.row, request.col, e);
        e
    })?;

    Ok(Json(ClaimResponse::from(&result)))
}

/// Occupancy and connection counts
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let dimensions = state.grid.dimensions();

    Json(StatsResponse {
        rows: dimensions.rows,
        cols: dimensions.cols,
        claimed: state.grid.claimed_count(),
        total: dimensions.total(),
        subscribers: state.sync_hub.subscriber_count(),
    })
}
