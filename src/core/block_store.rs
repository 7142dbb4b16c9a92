use once_cell::sync::OnceCell;
use std::sync::Arc;

use super::{Cell, ClaimError, Dimensions, OwnershipRecord};

/// Result of an insert-if-absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This call created the record
    Inserted,
    /// A record was already present; it is returned unchanged
    Existing(Arc<OwnershipRecord>),
}

/// Hook run on a record before it becomes visible
pub type Commit<'a> = &'a (dyn Fn(Cell, &OwnershipRecord) -> Result<(), ClaimError> + Sync);

/// Storage engine behind the grid
///
/// Implementations must make `insert_if_absent` atomic per cell: among any
/// number of concurrent calls for the same cell, exactly one returns
/// `Inserted`. Records are never updated or removed.
pub trait BlockStore: Send + Sync {
    /// Store `record` for `cell` unless the cell already has one
    ///
    /// `commit` runs exactly once for the winning record, before any reader
    /// can see it. If it fails the cell stays empty and the error is returned.
    fn insert_if_absent(
        &self,
        cell: Cell,
        record: Arc<OwnershipRecord>,
        commit: Commit<'_>,
    ) -> Result<InsertOutcome, ClaimError>;

    /// Point lookup by cell
    fn get(&self, cell: Cell) -> Result<Option<Arc<OwnershipRecord>>, ClaimError>;

    /// Every stored record, in row-major order
    fn scan(&self) -> Result<Vec<(Cell, Arc<OwnershipRecord>)>, ClaimError>;
}

/// In-process engine: one write-once slot per cell
///
/// Different cells never contend. Readers never block; a slot whose first
/// write is still committing reads as empty.
pub struct MemoryBlockStore {
    dimensions: Dimensions,
    slots: Box<[OnceCell<Arc<OwnershipRecord>>]>,
}

impl MemoryBlockStore {
    pub fn new(dimensions: Dimensions) -> Self {
        let slots = (0..dimensions.total())
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self { dimensions, slots }
    }

    fn slot(&self, cell: Cell) -> Result<&OnceCell<Arc<OwnershipRecord>>, ClaimError> {
        self.dimensions
            .index(cell)
            .and_then(|index| self.slots.get(index))
            .ok_or_else(|| {
                ClaimError::InvalidCoordinate(format!("cell {} is outside the grid", cell.key()))
            })
    }
}

impl BlockStore for MemoryBlockStore {
    fn insert_if_absent(
        &self,
        cell: Cell,
        record: Arc<OwnershipRecord>,
        commit: Commit<'_>,
    ) -> Result<InsertOutcome, ClaimError> {
        let slot = self.slot(cell)?;

        // Concurrent callers for this slot wait here until the winner's
        // commit returns; on failure the next one gets to try.
        let mut inserted = false;
        let current = slot.get_or_try_init(|| {
            commit(cell, &record)?;
            inserted = true;
            Ok::<_, ClaimError>(record)
        })?;

        if inserted {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Existing(Arc::clone(current)))
        }
    }

    fn get(&self, cell: Cell) -> Result<Option<Arc<OwnershipRecord>>, ClaimError> {
        Ok(self.slot(cell)?.get().cloned())
    }

    fn scan(&self) -> Result<Vec<(Cell, Arc<OwnershipRecord>)>, ClaimError> {
        Ok(self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.get()
                    .map(|record| (self.dimensions.cell_at(index), Arc::clone(record)))
            })
            .collect())
    }
}
