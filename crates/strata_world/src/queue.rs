//! # Request Queues
//!
//! Chunk coordinates flow from the scheduler to the worker pool through
//! bounded `crossbeam_channel` queues. Each queue:
//!
//! - coalesces duplicates: a coordinate already waiting is not queued twice
//! - applies an explicit overflow policy when full
//! - exposes depth and counters for monitoring
//!
//! Released chunks flow the other way, from the deletion workers to the
//! render collaborator, through an unbounded `ReleaseQueue`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use strata_procedural::ChunkCoord;

/// What happens when a request arrives at a full queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Refuse the request; the producer retries on a later tick.
    DropNewest,
    /// Wait for space. Nothing is ever lost.
    Block,
}

/// Outcome of offering a coordinate to a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Offer {
    /// Queued.
    Accepted,
    /// Already waiting in the queue.
    Coalesced,
    /// Refused by `DropNewest` because the queue is (nearly) full.
    Dropped,
    /// The queue was closed.
    Closed,
}

/// Point-in-time queue counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    /// Requests currently waiting.
    pub depth: usize,
    /// Channel capacity.
    pub capacity: usize,
    /// Requests queued since creation.
    pub accepted: u64,
    /// Requests merged into one already waiting.
    pub coalesced: u64,
    /// Requests refused by the overflow policy.
    pub dropped: u64,
}

struct QueueState {
    /// `None` once closed.
    sender: Option<Sender<ChunkCoord>>,
    /// Coordinates sent but not yet received.
    waiting: HashSet<ChunkCoord>,
}

/// Bounded, coalescing queue of chunk coordinates.
pub struct RequestQueue {
    name: &'static str,
    policy: OverflowPolicy,
    capacity: usize,
    headroom: usize,
    receiver: Receiver<ChunkCoord>,
    state: Mutex<QueueState>,
    accepted: AtomicU64,
    coalesced: AtomicU64,
    dropped: AtomicU64,
}

impl RequestQueue {
    /// Creates a queue.
    ///
    /// With `DropNewest`, an offer is refused once `depth + headroom`
    /// reaches `capacity`, leaving `headroom` slots free.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize, headroom: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            name,
            policy,
            capacity,
            headroom: headroom.min(capacity - 1),
            receiver,
            state: Mutex::new(QueueState {
                sender: Some(sender),
                waiting: HashSet::with_capacity(capacity.min(4096)),
            }),
            accepted: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Admission queue: small, drops when nearly full.
    #[must_use]
    pub fn admission(capacity: usize, headroom: usize) -> Self {
        Self::new("admission", capacity, headroom, OverflowPolicy::DropNewest)
    }

    /// Eviction queue: blocks rather than losing a removal.
    #[must_use]
    pub fn eviction(capacity: usize) -> Self {
        Self::new("eviction", capacity, 0, OverflowPolicy::Block)
    }

    /// Queue name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Overflow policy of this queue.
    #[must_use]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Offers a coordinate according to the queue's overflow policy.
    ///
    /// With `Block` this waits for a worker to free a slot.
    pub fn offer(&self, coord: ChunkCoord) -> Offer {
        let mut state = self.state.lock();
        if state.waiting.contains(&coord) {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            return Offer::Coalesced;
        }
        let Some(sender) = state.sender.as_ref() else {
            return Offer::Closed;
        };

        let sent = match self.policy {
            OverflowPolicy::DropNewest => {
                if sender.len() + self.headroom >= self.capacity {
                    Err(Offer::Dropped)
                } else {
                    sender.try_send(coord).map_err(|e| match e {
                        TrySendError::Full(_) => Offer::Dropped,
                        TrySendError::Disconnected(_) => Offer::Closed,
                    })
                }
            }
            // The receiver end is owned by `self`, so this only waits for space
            OverflowPolicy::Block => sender.send(coord).map_err(|_| Offer::Closed),
        };

        match sent {
            Ok(()) => {
                state.waiting.insert(coord);
                self.accepted.fetch_add(1, Ordering::Relaxed);
                Offer::Accepted
            }
            Err(Offer::Dropped) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(queue = self.name, x = coord.x, z = coord.z, "request dropped, queue full");
                Offer::Dropped
            }
            Err(other) => other,
        }
    }

    /// Blocks until a coordinate is available.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn recv(&self) -> Option<ChunkCoord> {
        let coord = self.receiver.recv().ok()?;
        self.state.lock().waiting.remove(&coord);
        Some(coord)
    }

    /// Takes a coordinate if one is waiting.
    pub fn try_recv(&self) -> Option<ChunkCoord> {
        let coord = self.receiver.try_recv().ok()?;
        self.state.lock().waiting.remove(&coord);
        Some(coord)
    }

    /// Closes the queue. Waiting requests can still be received.
    pub fn close(&self) {
        if self.state.lock().sender.take().is_some() {
            tracing::debug!(queue = self.name, "queue closed");
        }
    }

    /// Returns true once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().sender.is_none()
    }

    /// Requests currently waiting.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.receiver.len()
    }

    /// Snapshot of the queue counters.
    #[must_use]
    pub fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            depth: self.depth(),
            capacity: self.capacity,
            accepted: self.accepted.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Notice that a chunk left the registry.
///
/// The render collaborator resolves the coordinate in its own resource
/// table and destroys whatever GPU objects it allocated for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkRelease {
    /// Coordinate of the removed chunk.
    pub coord: ChunkCoord,
    /// Mesh revision the chunk had when it was removed.
    pub revision: u64,
    /// Residency that ended. Resources of a later residency are untouched.
    pub epoch: u64,
}

/// Unbounded queue of chunk releases, drained by the render thread.
pub struct ReleaseQueue {
    sender: Sender<ChunkRelease>,
    receiver: Receiver<ChunkRelease>,
}

impl ReleaseQueue {
    /// Creates an empty release queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Pushes a release. Never blocks, never drops.
    pub fn push(&self, release: ChunkRelease) {
        // Both ends live in `self`, so the channel cannot be disconnected
        let _ = self.sender.send(release);
    }

    /// Takes every release currently queued.
    #[must_use]
    pub fn drain(&self) -> Vec<ChunkRelease> {
        self.receiver.try_iter().collect()
    }

    /// Releases waiting to be drained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for ReleaseQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_policy() {
        let admit = RequestQueue::admission(8, 1);
        let evict = RequestQueue::eviction(8);
        assert_eq!((admit.name(), admit.policy()), ("admission", OverflowPolicy::DropNewest));
        assert_eq!((evict.name(), evict.policy()), ("eviction", OverflowPolicy::Block));
        assert_eq!(evict.metrics().capacity, 8);
    }

    #[test]
    fn test_duplicates_coalesce() {
        let queue = RequestQueue::admission(8, 0);
        let c = ChunkCoord::new(1, 2);

        assert_eq!(queue.offer(c), Offer::Accepted);
        assert_eq!(queue.offer(c), Offer::Coalesced);
        assert_eq!(queue.depth(), 1);

        assert_eq!(queue.try_recv(), Some(c));
        // Once taken, the coordinate may be queued again
        assert_eq!(queue.offer(c), Offer::Accepted);

        let m = queue.metrics();
        assert_eq!((m.accepted, m.coalesced, m.dropped), (2, 1, 0));
    }

    #[test]
    fn test_drop_newest_keeps_headroom() {
        let queue = RequestQueue::admission(4, 1);

        for i in 0..10 {
            queue.offer(ChunkCoord::new(i, 0));
        }

        let m = queue.metrics();
        assert_eq!(m.depth, 3, "one slot stays free");
        assert_eq!(m.accepted, 3);
        assert_eq!(m.dropped, 7);
    }

    #[test]
    fn test_block_policy_never_drops() {
        let queue = std::sync::Arc::new(RequestQueue::eviction(2));
        let consumer = {
            let queue = std::sync::Arc::clone(&queue);
            std::thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(c) = queue.recv() {
                    seen.push(c);
                }
                seen
            })
        };

        for i in 0..50 {
            assert_eq!(queue.offer(ChunkCoord::new(i, i)), Offer::Accepted);
        }
        queue.close();

        let seen = consumer.join().expect("consumer thread");
        assert_eq!(seen.len(), 50);
        assert_eq!(queue.metrics().dropped, 0);
    }

    #[test]
    fn test_closed_queue_refuses_and_drains() {
        let queue = RequestQueue::admission(4, 0);
        queue.offer(ChunkCoord::new(0, 0));
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.offer(ChunkCoord::new(1, 1)), Offer::Closed);
        assert_eq!(queue.recv(), Some(ChunkCoord::new(0, 0)));
        assert_eq!(queue.recv(), None);
    }

    #[test]
    fn test_release_queue_drain() {
        let releases = ReleaseQueue::new();
        releases.push(ChunkRelease { coord: ChunkCoord::new(3, 4), revision: 2, epoch: 1 });
        releases.push(ChunkRelease { coord: ChunkCoord::new(5, 6), revision: 1, epoch: 2 });

        assert_eq!(releases.len(), 2);
        let drained = releases.drain();
        assert_eq!(drained[0].coord, ChunkCoord::new(3, 4));
        assert!(releases.is_empty());
    }
}
