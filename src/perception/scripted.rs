//! In-memory perception source driven frame by frame
//!
//! Used by tests, scenario replay and the random scenario generator.
//! Frames are either set directly or queued; queued frames are consumed one
//! per `begin_tick`, and the last frame stays current once the queue is empty.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{LabelRef, ObjectHandle, PerceptionSource};
use crate::core::error::PerceptionError;
use crate::core::types::{ObjectAddress, Position};

/// One object in a scripted frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedObject {
    pub address: u64,
    pub position: [f32; 3],
    #[serde(default = "default_true")]
    pub alive: bool,
    #[serde(default = "default_true")]
    pub targetable: bool,
    #[serde(default)]
    pub is_operator: bool,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
    /// Label text; absent when no label is rendered
    #[serde(default)]
    pub label: Option<Vec<String>>,
    /// Make every label read for this object fail
    #[serde(default)]
    pub fail_reads: bool,
}

fn default_true() -> bool {
    true
}

fn default_capabilities() -> Vec<String> {
    vec!["Monolith".into()]
}

impl ScriptedObject {
    /// A valid, labelled monolith
    pub fn monolith(address: u64, position: [f32; 3], label: &[&str]) -> Self {
        Self {
            address,
            position,
            alive: true,
            targetable: true,
            is_operator: false,
            capabilities: default_capabilities(),
            label: Some(label.iter().map(|s| s.to_string()).collect()),
            fail_reads: false,
        }
    }

    pub fn without_label(mut self) -> Self {
        self.label = None;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    fn handle(&self) -> ObjectHandle {
        ObjectHandle {
            address: ObjectAddress(self.address),
            position: Position::from_array(self.position),
            alive: self.alive,
            targetable: self.targetable,
            is_operator: self.is_operator,
            capabilities: self.capabilities.clone(),
        }
    }
}

/// Complete world state for one sampling pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedFrame {
    #[serde(default)]
    pub operator: [f32; 3],
    #[serde(default)]
    pub ui_blocked: bool,
    /// Make enumeration itself fail for this frame
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub objects: Vec<ScriptedObject>,
}

impl ScriptedFrame {
    pub fn new(operator: [f32; 3], objects: Vec<ScriptedObject>) -> Self {
        Self {
            operator,
            objects,
            ..Default::default()
        }
    }

    fn object(&self, address: ObjectAddress) -> Option<&ScriptedObject> {
        self.objects.iter().find(|o| o.address == address.0)
    }
}

#[derive(Debug, Default)]
pub struct ScriptedSource {
    current: Mutex<ScriptedFrame>,
    queued: Mutex<VecDeque<ScriptedFrame>>,
    locate_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that plays the given frames in order, one per tick
    pub fn from_frames(frames: impl IntoIterator<Item = ScriptedFrame>) -> Self {
        let source = Self::new();
        for frame in frames {
            source.push_frame(frame);
        }
        source
    }

    /// Replace the current frame immediately
    pub fn set_frame(&self, frame: ScriptedFrame) {
        *lock(&self.current) = frame;
    }

    /// Queue a frame for a later tick
    pub fn push_frame(&self, frame: ScriptedFrame) {
        lock(&self.queued).push_back(frame);
    }

    pub fn remaining_frames(&self) -> usize {
        lock(&self.queued).len()
    }

    /// Number of `locate_label` calls so far
    pub fn locate_calls(&self) -> usize {
        self.locate_calls.load(Ordering::Relaxed)
    }
}

impl PerceptionSource for ScriptedSource {
    fn begin_tick(&self) {
        if let Some(next) = lock(&self.queued).pop_front() {
            *lock(&self.current) = next;
        }
    }

    fn enumerate_objects(&self) -> Result<Vec<ObjectHandle>, PerceptionError> {
        let frame = lock(&self.current);
        if frame.unavailable {
            return Err(PerceptionError::Unavailable("scripted outage".into()));
        }
        Ok(frame.objects.iter().map(ScriptedObject::handle).collect())
    }

    fn operator_position(&self) -> Position {
        Position::from_array(lock(&self.current).operator)
    }

    fn ui_blocking_panels_open(&self) -> bool {
        lock(&self.current).ui_blocked
    }

    fn locate_label(&self, address: ObjectAddress) -> Result<Option<LabelRef>, PerceptionError> {
        self.locate_calls.fetch_add(1, Ordering::Relaxed);
        let frame = lock(&self.current);
        match frame.object(address) {
            None => Err(PerceptionError::ObjectGone(address)),
            Some(obj) if obj.fail_reads => Err(PerceptionError::ReadFailed(
                address,
                "label container unreadable".into(),
            )),
            Some(obj) => Ok(obj.label.as_ref().map(|_| LabelRef(address.0))),
        }
    }

    fn read_label(&self, label: LabelRef) -> Result<Option<Vec<String>>, PerceptionError> {
        let address = ObjectAddress(label.0);
        let frame = lock(&self.current);
        match frame.object(address) {
            None => Err(PerceptionError::ObjectGone(address)),
            Some(obj) if obj.fail_reads => Err(PerceptionError::ReadFailed(
                address,
                "label text unreadable".into(),
            )),
            Some(obj) => Ok(obj.label.clone()),
        }
    }
}

// A panicking test thread must not take the scripted world down with it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
