//! Read side of the tracker
//!
//! The tracker publishes an immutable [`TrackerSnapshot`] at the end of every
//! tick. Readers clone the current `Arc` and iterate it at leisure; the lock
//! is held only for the pointer copy, so a reader never observes a map in
//! the middle of an insert, rekey, remove or session reset.

use std::sync::{Arc, RwLock};

use super::identity::TrackedIdentity;
use crate::core::types::{SessionId, Tick};
use crate::outcome::OutcomeSnapshot;

#[derive(Debug, Clone, Default)]
pub struct TrackerSnapshot {
    pub session: SessionId,
    pub tick: Tick,
    /// Active identities ordered by id
    pub identities: Vec<TrackedIdentity>,
    pub outcomes: OutcomeSnapshot,
}

impl TrackerSnapshot {
    pub fn empty(session: SessionId) -> Self {
        Self {
            session,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Identities currently in perception range
    pub fn visible(&self) -> impl Iterator<Item = &TrackedIdentity> {
        self.identities.iter().filter(|i| !i.unloaded)
    }
}

/// Cheap clonable handle for reading the latest snapshot
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    slot: Arc<RwLock<Arc<TrackerSnapshot>>>,
}

impl SnapshotReader {
    pub fn load(&self) -> Arc<TrackerSnapshot> {
        match self.slot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

/// Write side, owned by the tracker
#[derive(Debug)]
pub(crate) struct SnapshotPublisher {
    slot: Arc<RwLock<Arc<TrackerSnapshot>>>,
}

impl SnapshotPublisher {
    pub fn new(initial: TrackerSnapshot) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }

    pub fn publish(&self, snapshot: TrackerSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.slot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{IdentityId, ObjectAddress, Position};

    #[test]
    fn test_reader_sees_latest_publish() {
        let session = SessionId::new();
        let publisher = SnapshotPublisher::new(TrackerSnapshot::empty(session));
        let reader = publisher.reader();
        assert!(reader.load().is_empty());

        let held = reader.load();
        publisher.publish(TrackerSnapshot {
            session,
            tick: 3,
            identities: vec![TrackedIdentity::new(IdentityId(1), ObjectAddress(1), Position::ZERO, 3)],
            outcomes: OutcomeSnapshot::default(),
        });

        assert_eq!(reader.load().tick, 3);
        assert_eq!(reader.load().len(), 1);
        // An Arc taken before the publish is unaffected
        assert!(held.is_empty());
    }
}
