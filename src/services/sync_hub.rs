use std::sync::Arc;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use crate::core::{
    ClaimError, GridSnapshot, GridStore, SequencedBlock, MAX_COALESCED_BLOCKS,
    MAX_SUBSCRIBER_BUFFER,
};

/// A store change, published once per winning claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    BlockClaimed(SequencedBlock),
}

/// What a subscriber is sent next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridUpdate {
    /// Full state: the first message, and the resync after falling behind
    Snapshot(GridSnapshot),
    /// One or more newly claimed blocks, ordered by sequence number
    BlocksClaimed(Vec<SequencedBlock>),
}

/// Broadcast point between the write path and every open subscription
///
/// Publishing never waits on a subscriber. Each subscriber buffers at most
/// `buffer` events; past that the oldest are dropped and the subscriber
/// receives a fresh snapshot instead.
#[derive(Clone)]
pub struct SyncHub {
    tx: broadcast::Sender<GridEvent>,
}

impl SyncHub {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.clamp(1, MAX_SUBSCRIBER_BUFFER));
        Self { tx }
    }

    /// Publish an event to every subscriber
    ///
    /// # Returns
    ///
    /// Number of subscribers the event was queued for
    pub fn publish(&self, event: GridEvent) -> usize {
        // No receivers is not an error
        self.tx.send(event).unwrap_or(0)
    }

    /// Open a subscription whose first update is the current snapshot
    ///
    /// The receiver is registered before the snapshot is taken, so no claim
    /// can fall between the two.
    pub fn subscribe(&self, store: Arc<GridStore>) -> Result<Subscription, ClaimError> {
        let rx = self.tx.subscribe();
        let initial = store.snapshot()?;

        Ok(Subscription {
            rx,
            store,
            snapshot_seq: initial.seq,
            initial: Some(initial),
        })
    }

    /// Number of open subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One subscriber's view of the grid. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<GridEvent>,
    store: Arc<GridStore>,
    /// Blocks at or below this were part of the last snapshot sent
    snapshot_seq: u64,
    initial: Option<GridSnapshot>,
}

impl Subscription {
    /// Wait for the next update
    ///
    /// Events already queued are merged into one `BlocksClaimed` (up to
    /// `MAX_COALESCED_BLOCKS`), sorted by sequence number. Blocks already
    /// covered by the last snapshot are not repeated. Returns None once the
    /// hub is gone.
    ///
    /// Cancel-safe: the only await point is the broadcast receive.
    pub async fn next_update(&mut self) -> Option<GridUpdate> {
        if let Some(snapshot) = self.initial.take() {
            return Some(GridUpdate::Snapshot(snapshot));
        }

        loop {
            let update = match self.rx.recv().await {
                Ok(event) => self.coalesce(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber fell behind by {} events, resyncing", skipped);
                    self.resync()
                }
                Err(RecvError::Closed) => return None,
            };

            match update {
                Some(GridUpdate::BlocksClaimed(blocks)) if blocks.is_empty() => continue,
                other => return other,
            }
        }
    }

    fn coalesce(&mut self, first: GridEvent) -> Option<GridUpdate> {
        let GridEvent::BlockClaimed(block) = first;
        let mut blocks = vec![block];

        while blocks.len() < MAX_COALESCED_BLOCKS {
            match self.rx.try_recv() {
                Ok(GridEvent::BlockClaimed(block)) => blocks.push(block),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber fell behind by {} events, resyncing", skipped);
                    return self.resync();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        blocks.retain(|block| block.seq > self.snapshot_seq);
        blocks.sort_by_key(|block| block.seq);
        Some(GridUpdate::BlocksClaimed(blocks))
    }

    fn resync(&mut self) -> Option<GridUpdate> {
        match self.store.snapshot() {
            Ok(snapshot) => {
                self.snapshot_seq = snapshot.seq;
                Some(GridUpdate::Snapshot(snapshot))
            }
            Err(e) => {
                tracing::error!("Failed to snapshot grid for resync: {}", e);
                None
            }
        }
    }
}
