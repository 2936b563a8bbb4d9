//! Perception interface - what the tracker can see of the world
//!
//! The tracker never talks to the game directly. Everything it needs goes
//! through [`PerceptionSource`], which tests and the replay tools implement
//! with [`ScriptedSource`].

pub mod scripted;

pub use scripted::{ScriptedFrame, ScriptedObject, ScriptedSource};

use serde::{Deserialize, Serialize};

use crate::core::error::PerceptionError;
use crate::core::types::{is_usable_position, ObjectAddress, Position};

/// One world object as enumerated this sampling pass
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHandle {
    pub address: ObjectAddress,
    pub position: Position,
    pub alive: bool,
    pub targetable: bool,
    /// True for the operator's own avatar
    pub is_operator: bool,
    pub capabilities: Vec<String>,
}

impl ObjectHandle {
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c == name)
    }
}

/// Opaque token for an on-screen label located for an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelRef(pub u64);

/// Source of world observations
///
/// Reads may fail transiently (object unloaded mid-read); callers treat a
/// failure as "no update this pass" for that object only.
pub trait PerceptionSource {
    /// Called once at the start of every tick, before any other read
    fn begin_tick(&self) {}

    /// Objects currently known to the perception layer
    fn enumerate_objects(&self) -> Result<Vec<ObjectHandle>, PerceptionError>;

    /// Current position of the operator's avatar
    fn operator_position(&self) -> Position;

    /// Whether UI panels currently obscure or pause the world
    fn ui_blocking_panels_open(&self) -> bool;

    /// Find the label belonging to an object. `Ok(None)` means no label is
    /// rendered for it right now.
    fn locate_label(&self, address: ObjectAddress) -> Result<Option<LabelRef>, PerceptionError>;

    /// Read the text fragments of a previously located label. `Ok(None)`
    /// means the label exists but has no readable text.
    fn read_label(&self, label: LabelRef) -> Result<Option<Vec<String>>, PerceptionError>;
}

impl<T: PerceptionSource + ?Sized> PerceptionSource for std::sync::Arc<T> {
    fn begin_tick(&self) {
        (**self).begin_tick()
    }

    fn enumerate_objects(&self) -> Result<Vec<ObjectHandle>, PerceptionError> {
        (**self).enumerate_objects()
    }

    fn operator_position(&self) -> Position {
        (**self).operator_position()
    }

    fn ui_blocking_panels_open(&self) -> bool {
        (**self).ui_blocking_panels_open()
    }

    fn locate_label(&self, address: ObjectAddress) -> Result<Option<LabelRef>, PerceptionError> {
        (**self).locate_label(address)
    }

    fn read_label(&self, label: LabelRef) -> Result<Option<Vec<String>>, PerceptionError> {
        (**self).read_label(label)
    }
}

/// Validity filter applied before an object is tracked at all
pub fn passes_filter(handle: &ObjectHandle, required_capabilities: &[String]) -> bool {
    !handle.address.is_null()
        && handle.alive
        && handle.targetable
        && !handle.is_operator
        && required_capabilities.iter().all(|c| handle.has_capability(c))
        && is_usable_position(handle.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monolith(address: u64) -> ObjectHandle {
        ObjectHandle {
            address: ObjectAddress(address),
            position: Position::new(10.0, 20.0, 0.0),
            alive: true,
            targetable: true,
            is_operator: false,
            capabilities: vec!["Monolith".into(), "Render".into()],
        }
    }

    fn required() -> Vec<String> {
        vec!["Monolith".into()]
    }

    #[test]
    fn test_valid_object_passes() {
        assert!(passes_filter(&monolith(100), &required()));
    }

    #[test]
    fn test_filter_rejections() {
        let mut h = monolith(0);
        assert!(!passes_filter(&h, &required()));

        h = monolith(1);
        h.alive = false;
        assert!(!passes_filter(&h, &required()));

        h = monolith(1);
        h.targetable = false;
        assert!(!passes_filter(&h, &required()));

        h = monolith(1);
        h.is_operator = true;
        assert!(!passes_filter(&h, &required()));

        h = monolith(1);
        h.capabilities = vec!["Chest".into()];
        assert!(!passes_filter(&h, &required()));

        h = monolith(1);
        h.position = Position::new(f32::NAN, 0.0, 0.0);
        assert!(!passes_filter(&h, &required()));
    }

    #[test]
    fn test_origin_is_a_usable_position() {
        let mut h = monolith(1);
        h.position = Position::ZERO;
        assert!(passes_filter(&h, &required()));
    }
}
