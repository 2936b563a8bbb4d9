//! One logical object tracked across address changes

use serde::Serialize;

use crate::classify::Classification;
use crate::core::types::{IdentityId, ObjectAddress, Position, Tick};
use crate::perception::LabelRef;

/// Decision derived from the latest classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Recommendation {
    /// No readable label yet
    #[default]
    Unclassified,
    ActOn,
    LeaveAlone,
}

impl Recommendation {
    /// A finalized object can't be acted on again, whatever its contents
    pub fn from_classification(c: &Classification) -> Self {
        if !c.valid {
            Recommendation::Unclassified
        } else if c.recommended && !c.already_finalized {
            Recommendation::ActOn
        } else {
            Recommendation::LeaveAlone
        }
    }
}

/// How an action-taken transition compared to the recommendation at the time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionVerdict {
    Correct,
    Wrong,
    /// Acted on before any readable label was seen
    Unjudged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedIdentity {
    pub id: IdentityId,
    pub current_address: ObjectAddress,
    pub last_known_position: Option<Position>,
    pub classification: Classification,
    /// Classification just before the object was acted on
    pub previous_classification: Option<Classification>,
    pub recommendation: Recommendation,
    pub previous_recommendation: Recommendation,
    pub acted_upon: bool,
    pub consumed: bool,
    pub missed_opportunity: bool,
    pub wrong_action: bool,
    /// Out of perception range, waiting to reappear
    pub unloaded: bool,
    pub first_seen: Tick,
    pub last_seen: Tick,
    /// Cached label location; cleared whenever it may have gone stale
    pub(crate) label: Option<LabelRef>,
}

impl TrackedIdentity {
    pub fn new(id: IdentityId, address: ObjectAddress, position: Position, tick: Tick) -> Self {
        Self {
            id,
            current_address: address,
            last_known_position: Some(position),
            classification: Classification::invalid(),
            previous_classification: None,
            recommendation: Recommendation::Unclassified,
            previous_recommendation: Recommendation::Unclassified,
            acted_upon: false,
            consumed: false,
            missed_opportunity: false,
            wrong_action: false,
            unloaded: false,
            first_seen: tick,
            last_seen: tick,
            label: None,
        }
    }

    pub fn is_priority(&self) -> bool {
        self.classification.has_priority_marker
    }

    pub fn has_cached_label(&self) -> bool {
        self.label.is_some()
    }

    /// Record a fresh sighting at `position`
    pub(crate) fn observe(&mut self, position: Position, tick: Tick) {
        self.last_known_position = Some(position);
        self.last_seen = tick;
        self.unloaded = false;
    }

    /// Store a new classification and detect the finalized transition.
    ///
    /// Returns a verdict only on the tick the label first turns finalized
    /// after having been seen in an actionable state. Objects first seen
    /// already finalized never produce one.
    pub(crate) fn apply_classification(&mut self, next: Classification) -> Option<ActionVerdict> {
        let was_actionable = self.classification.valid && !self.classification.already_finalized;
        let mut verdict = None;

        if was_actionable && next.already_finalized && !self.acted_upon {
            self.acted_upon = true;
            self.previous_classification = Some(self.classification.clone());
            self.previous_recommendation = self.recommendation;

            verdict = Some(match self.recommendation {
                Recommendation::ActOn => ActionVerdict::Correct,
                Recommendation::LeaveAlone => {
                    self.wrong_action = true;
                    ActionVerdict::Wrong
                }
                Recommendation::Unclassified => ActionVerdict::Unjudged,
            });
        }

        self.recommendation = Recommendation::from_classification(&next);
        self.classification = next;
        verdict
    }

    /// Mark the identity consumed. Returns true if this also counts as a
    /// missed opportunity; both flags are set at most once.
    pub(crate) fn retire_consumed(&mut self) -> bool {
        self.consumed = true;
        if self.recommendation == Recommendation::ActOn && !self.acted_upon && !self.missed_opportunity {
            self.missed_opportunity = true;
            return true;
        }
        false
    }
}
