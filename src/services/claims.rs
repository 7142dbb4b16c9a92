use serde_json::Value;
use std::sync::Arc;

use crate::{
    auth::IdentityProvider,
    core::{ClaimError, ClaimResult, GridStore, Identity},
    models::requests::parse_coordinate,
};

use super::sync_hub::{GridEvent, SyncHub};

/// Full write path: validate, authenticate, claim, publish
///
/// # Arguments
///
/// * `grid` - The authoritative grid store
/// * `hub` - Broadcast point for subscribers
/// * `identities` - Identity provider used to verify the credential
/// * `row` / `col` - Raw coordinate values as received on the wire
/// * `raw_credential` - Unverified credential attached to the request
///
/// # Errors
///
/// - `InvalidCoordinate` for missing, non-integer or out-of-bounds values
/// - `Unauthenticated` when the credential does not verify
/// - `Storage` when the claim could not be made durable
///
/// The first two are raised before the store is touched; coordinates are
/// checked first.
pub async fn submit_claim(
    grid: &Arc<GridStore>,
    hub: &SyncHub,
    identities: &dyn IdentityProvider,
    row: &Value,
    col: &Value,
    raw_credential: Option<&str>,
) -> Result<ClaimResult, ClaimError> {
    let row = parse_coordinate("row", row)?;
    let col = parse_coordinate("col", col)?;
    grid.resolve(row, col)?;

    let identity = identities.verify(raw_credential)?;
    claim_as(grid, hub, row, col, identity).await
}

/// Claim on behalf of an already-verified identity and publish a win
///
/// A journaled grid writes to disk while claiming, so the claim runs on the
/// blocking pool instead of the calling worker.
pub async fn claim_as(
    grid: &Arc<GridStore>,
    hub: &SyncHub,
    row: i64,
    col: i64,
    identity: Identity,
) -> Result<ClaimResult, ClaimError> {
    let result = if grid.is_journaled() {
        let grid = Arc::clone(grid);
        let identity = identity.clone();
        tokio::task::spawn_blocking(move || grid.claim(row, col, &identity))
            .await
            .map_err(|e| ClaimError::Storage(format!("claim task failed: {}", e)))??
    } else {
        grid.claim(row, col, &identity)?
    };

    match &result {
        ClaimResult::Claimed(claimed) => {
            let delivered = hub.publish(GridEvent::BlockClaimed(claimed.clone()));
            tracing::info!(
                "Block {} claimed by {} as seq {} (pushed to {} subscribers)",
                claimed.block.key,
                identity.id,
                claimed.seq,
                delivered
            );
        }
        ClaimResult::AlreadyOwned { owner_id } => {
            tracing::debug!(
                "Claim on {}:{} by {} lost to {}",
                row,
                col,
                identity.id,
                owner_id
            );
        }
    }

    Ok(result)
}
