use std::collections::VecDeque;

use super::identity::TrackedIdentity;
use crate::core::types::IdentityId;

/// Bounded buffer of retired identities, oldest evicted first
#[derive(Debug, Clone)]
pub struct IdentityHistory {
    entries: VecDeque<TrackedIdentity>,
    capacity: usize,
}

impl IdentityHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, identity: TrackedIdentity) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(identity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, id: IdentityId) -> Option<&TrackedIdentity> {
        self.entries.iter().rev().find(|e| e.id == id)
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TrackedIdentity> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for IdentityHistory {
    fn default() -> Self {
        Self::new(64)
    }
}
