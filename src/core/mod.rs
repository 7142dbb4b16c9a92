pub mod block_store;
pub mod cell;
pub mod constants;
pub mod error;
pub mod grid_store;
pub mod journal;
pub mod ownership;

pub use block_store::{BlockStore, Commit, InsertOutcome, MemoryBlockStore};
pub use cell::{Cell, Dimensions};
pub use constants::*;
pub use error::ClaimError;
pub use grid_store::{ClaimResult, GridSnapshot, GridStore, SequencedBlock};
pub use journal::ClaimJournal;
pub use ownership::{Block, Identity, OwnershipRecord};
