//! Identity resolution - match an observed address to a tracked identity
//!
//! Address equality wins. Otherwise an identity that was not observed this
//! tick and lies within `tolerance` of the observed position is taken over
//! and rekeyed under the new address. Otherwise a new identity is created.

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

use super::identity::TrackedIdentity;
use crate::core::types::{IdAllocator, IdentityId, ObjectAddress, Position, Tick};

/// What `resolve` did to find the identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Address already tracked
    Existing(IdentityId),
    /// Unloaded identity reappeared under a new address
    Rekeyed {
        id: IdentityId,
        from: ObjectAddress,
    },
    Created(IdentityId),
}

impl Resolution {
    pub fn id(&self) -> IdentityId {
        match *self {
            Resolution::Existing(id) | Resolution::Created(id) => id,
            Resolution::Rekeyed { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    tolerance: f32,
}

impl IdentityResolver {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Resolve one observation against the tracked map.
    ///
    /// `observed` holds every valid address seen this tick. Identities whose
    /// current address is in it are never spatially matched, which keeps one
    /// identity from being claimed twice in a pass and keeps a new object
    /// from stealing an identity that is still visible under its own address.
    /// After this returns, the identity is keyed under `address`.
    pub fn resolve(
        &self,
        tracked: &mut AHashMap<ObjectAddress, TrackedIdentity>,
        ids: &mut IdAllocator,
        address: ObjectAddress,
        position: Position,
        observed: &AHashSet<ObjectAddress>,
        tick: Tick,
    ) -> Resolution {
        if let Some(identity) = tracked.get(&address) {
            return Resolution::Existing(identity.id);
        }

        if let Some(from) = self.nearest_candidate(tracked, position, observed) {
            if let Some(mut identity) = tracked.remove(&from) {
                identity.current_address = address;
                // The cached label belonged to the old handle
                identity.label = None;
                let id = identity.id;
                tracked.insert(address, identity);
                return Resolution::Rekeyed { id, from };
            }
        }

        let id = ids.allocate();
        tracked.insert(address, TrackedIdentity::new(id, address, position, tick));
        Resolution::Created(id)
    }

    /// Closest unobserved identity within tolerance; ties go to the lowest id
    fn nearest_candidate(
        &self,
        tracked: &AHashMap<ObjectAddress, TrackedIdentity>,
        position: Position,
        observed: &AHashSet<ObjectAddress>,
    ) -> Option<ObjectAddress> {
        tracked
            .iter()
            .filter(|(address, _)| !observed.contains(*address))
            .filter_map(|(address, identity)| {
                let last = identity.last_known_position?;
                let distance = last.distance(position);
                (distance <= self.tolerance).then_some((OrderedFloat(distance), identity.id, *address))
            })
            .min_by_key(|&(distance, id, _)| (distance, id))
            .map(|(_, _, address)| address)
    }
}
