use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use super::{
    Block, BlockStore, Cell, ClaimError, ClaimJournal, Dimensions, Identity, InsertOutcome,
    MemoryBlockStore, OwnershipRecord,
};

/// A claimed block tagged with the order it became visible in
///
/// Sequence numbers start at 1 and have no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedBlock {
    pub seq: u64,
    #[serde(flatten)]
    pub block: Block,
}

/// Outcome of a well-formed claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    /// This call won the cell
    Claimed(SequencedBlock),
    /// The cell already had an owner (possibly the caller); nothing changed
    AlreadyOwned { owner_id: String },
}

impl ClaimResult {
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimResult::Claimed(_))
    }
}

/// Dimensions plus every claimed cell at some observed instant
///
/// Every block with a sequence number up to `seq` is included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub rows: u32,
    pub cols: u32,
    pub seq: u64,
    pub blocks: Vec<Block>,
}

impl GridSnapshot {
    pub fn owner_of(&self, row: u32, col: u32) -> Option<&OwnershipRecord> {
        self.blocks
            .iter()
            .find(|b| b.row == row && b.col == col)
            .map(|b| &b.owner)
    }
}

/// Authoritative cell -> owner mapping
///
/// `claim` is the only way a record gets written. With a journal attached a
/// record is only made visible once its journal line is written.
pub struct GridStore {
    dimensions: Dimensions,
    blocks: Box<dyn BlockStore>,
    sequence: AtomicU64,
    journal: Option<ClaimJournal>,
}

impl GridStore {
    /// Create an empty grid backed by the in-process slot table
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            blocks: Box::new(MemoryBlockStore::new(dimensions)),
            sequence: AtomicU64::new(0),
            journal: None,
        }
    }

    /// Create a grid over an arbitrary storage engine
    pub fn with_store(
        dimensions: Dimensions,
        blocks: Box<dyn BlockStore>,
    ) -> Result<Self, ClaimError> {
        let existing = blocks.scan()?.len() as u64;
        Ok(Self {
            dimensions,
            blocks,
            sequence: AtomicU64::new(existing),
            journal: None,
        })
    }

    /// Create a grid that replays and then appends to a claim journal
    ///
    /// Journal lines that are out of bounds, ownerless, or repeat an earlier
    /// key are skipped.
    pub fn with_journal(dimensions: Dimensions, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let store = Self::new(dimensions);

        let blocks = ClaimJournal::load(path)?;
        let total = blocks.len();
        let restored = store.replay(blocks);
        tracing::info!(
            "Restored {} of {} journaled claims from {}",
            restored,
            total,
            path.display()
        );

        Ok(store.journaled(ClaimJournal::open(path)?))
    }

    /// Attach an open journal; earlier claims are not written to it
    pub fn journaled(mut self, journal: ClaimJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    fn replay(&self, blocks: Vec<Block>) -> usize {
        let mut restored = 0;
        for block in blocks {
            let identity = block.owner.to_identity();
            match self.claim(block.row as i64, block.col as i64, &identity) {
                Ok(ClaimResult::Claimed(_)) => restored += 1,
                Ok(ClaimResult::AlreadyOwned { owner_id }) => tracing::warn!(
                    "Journal repeats block {} (kept owner {})",
                    block.key,
                    owner_id
                ),
                Err(e) => tracing::warn!("Skipping journaled block {}: {}", block.key, e),
            }
        }
        restored
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Whether a winning claim does blocking file I/O
    pub fn is_journaled(&self) -> bool {
        self.journal.is_some()
    }

    /// Number of claimed cells (also the latest sequence number)
    pub fn claimed_count(&self) -> usize {
        self.sequence.load(Ordering::Acquire) as usize
    }

    /// Claim a cell for `identity`
    ///
    /// Performs a single atomic insert-if-absent. Among concurrent calls for
    /// the same cell exactly one returns `Claimed`; every other call (and
    /// every later call) returns `AlreadyOwned` with the winner's id.
    ///
    /// # Errors
    ///
    /// - `InvalidCoordinate` when the cell is out of bounds
    /// - `Unauthenticated` when the identity has no subject id
    /// - `Storage` when the journal write fails; the cell stays unclaimed
    ///
    /// The first two are checked before storage is touched.
    pub fn claim(
        &self,
        row: i64,
        col: i64,
        identity: &Identity,
    ) -> Result<ClaimResult, ClaimError> {
        let cell = self.dimensions.cell(row, col)?;

        if !identity.is_authenticated() {
            return Err(ClaimError::Unauthenticated);
        }

        let record = Arc::new(OwnershipRecord::from(identity));
        let persist = |cell: Cell, record: &OwnershipRecord| self.persist(cell, record);

        match self
            .blocks
            .insert_if_absent(cell, Arc::clone(&record), &persist)?
        {
            InsertOutcome::Inserted => {
                // Taken after the record is visible, so a snapshot that reads
                // seq N has every block up to N
                let seq = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
                let block = Block::new(cell, (*record).clone());
                tracing::debug!("Block {} claimed by {} (seq {})", block.key, identity.id, seq);
                Ok(ClaimResult::Claimed(SequencedBlock { seq, block }))
            }
            InsertOutcome::Existing(existing) => Ok(ClaimResult::AlreadyOwned {
                owner_id: existing.owner_id.clone(),
            }),
        }
    }

    fn persist(&self, cell: Cell, record: &OwnershipRecord) -> Result<(), ClaimError> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };

        journal
            .append(&Block::new(cell, record.clone()))
            .map_err(|e| {
                tracing::error!(
                    "Failed to journal block {} to {}: {}",
                    cell.key(),
                    journal.path().display(),
                    e
                );
                ClaimError::Storage(format!("could not record claim on {}", cell.key()))
            })
    }

    /// Current owner of a cell, if any
    pub fn owner_of(&self, row: i64, col: i64) -> Result<Option<OwnershipRecord>, ClaimError> {
        let cell = self.dimensions.cell(row, col)?;
        Ok(self.blocks.get(cell)?.map(|record| (*record).clone()))
    }

    /// Dimensions plus every claimed cell, in row-major order
    pub fn snapshot(&self) -> Result<GridSnapshot, ClaimError> {
        let seq = self.sequence.load(Ordering::Acquire);
        let blocks = self
            .blocks
            .scan()?
            .into_iter()
            .map(|(cell, record)| Block::new(cell, (*record).clone()))
            .collect();

        Ok(GridSnapshot {
            rows: self.dimensions.rows,
            cols: self.dimensions.cols,
            seq,
            blocks,
        })
    }

    /// Look up the cell for a raw coordinate without touching storage
    pub fn resolve(&self, row: i64, col: i64) -> Result<Cell, ClaimError> {
        self.dimensions.cell(row, col)
    }
}
