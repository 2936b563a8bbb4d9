//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 3D world position as reported by the perception layer
pub type Position = glam::Vec3;

/// Tick counter (one executed sampling pass)
pub type Tick = u64;

/// Perception-layer handle for a world object.
///
/// Only stable while the object stays loaded; the same logical object can
/// come back under a different address after leaving perception range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectAddress(pub u64);

impl ObjectAddress {
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Stable identifier for one logical object within a tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(pub u64);

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier for a tracking session (one area visit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator for identity ids.
///
/// Starts at 1; ids are never handed out twice by the same allocator.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> IdentityId {
        let id = IdentityId(self.next);
        self.next += 1;
        id
    }

    /// Id the next call to `allocate` will return
    pub fn peek(&self) -> IdentityId {
        IdentityId(self.next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a position can be used for distance tests
pub fn is_usable_position(pos: Position) -> bool {
    pos.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        assert_eq!(a, IdentityId(1));
        assert!(a < b && b < c);
        assert_eq!(ids.peek(), IdentityId(4));
    }

    #[test]
    fn test_null_address() {
        assert!(ObjectAddress(0).is_null());
        assert!(!ObjectAddress(100).is_null());
        assert_eq!(ObjectAddress(255).to_string(), "0xff");
    }

    #[test]
    fn test_position_usability() {
        assert!(is_usable_position(Position::ZERO));
        assert!(!is_usable_position(Position::new(f32::NAN, 0.0, 0.0)));
        assert!(!is_usable_position(Position::new(0.0, f32::INFINITY, 0.0)));
    }

    #[test]
    fn test_session_ids_differ() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
