pub mod claims;
pub mod sync_hub;

pub use claims::{claim_as, submit_claim};
pub use sync_hub::{GridEvent, GridUpdate, Subscription, SyncHub};
