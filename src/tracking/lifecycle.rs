//! Lifecycle tracker - the per-tick scan-and-update pass
//!
//! Each tick:
//! 1. Skip entirely if UI panels block the world or enumeration fails
//! 2. Filter the enumerated objects down to trackable ones
//! 3. Resolve every object to an identity (address, then proximity)
//! 4. Refresh position, re-read the label, detect the finalized transition
//! 5. Reconcile identities that were not observed: unloaded or consumed
//! 6. Forward outcomes to the aggregator and publish a snapshot

use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

use super::history::IdentityHistory;
use super::identity::{ActionVerdict, Recommendation, TrackedIdentity};
use super::resolver::{IdentityResolver, Resolution};
use super::snapshot::{SnapshotPublisher, SnapshotReader, TrackerSnapshot};
use crate::classify::Classifier;
use crate::core::config::TrackerConfig;
use crate::core::error::PerceptionError;
use crate::core::types::{is_usable_position, IdAllocator, IdentityId, ObjectAddress, Position, SessionId, Tick};
use crate::outcome::{Outcome, OutcomeAggregator};
use crate::perception::{passes_filter, ObjectHandle, PerceptionSource};

/// Something that happened to an identity during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Created {
        id: IdentityId,
        address: ObjectAddress,
    },
    Rekeyed {
        id: IdentityId,
        from: ObjectAddress,
        to: ObjectAddress,
    },
    ActionTaken {
        id: IdentityId,
        verdict: ActionVerdict,
    },
    Unloaded {
        id: IdentityId,
    },
    Consumed {
        id: IdentityId,
        missed_opportunity: bool,
    },
}

/// Why a tick did not run
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    UiBlocked,
    PerceptionUnavailable(PerceptionError),
}

/// Summary of one tick, for logging and tests
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Tick number, `None` when the tick was skipped
    pub tick: Option<Tick>,
    pub skipped: Option<SkipReason>,
    /// Trackable objects seen this tick
    pub observed: usize,
    pub events: Vec<LifecycleEvent>,
    /// Objects whose label could not be read this tick
    pub failed_reads: Vec<(IdentityId, PerceptionError)>,
}

impl TickReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    pub fn created(&self) -> impl Iterator<Item = IdentityId> + '_ {
        self.events.iter().filter_map(|e| match e {
            LifecycleEvent::Created { id, .. } => Some(*id),
            _ => None,
        })
    }

    pub fn rekeyed(&self) -> impl Iterator<Item = IdentityId> + '_ {
        self.events.iter().filter_map(|e| match e {
            LifecycleEvent::Rekeyed { id, .. } => Some(*id),
            _ => None,
        })
    }

    pub fn unloaded(&self) -> impl Iterator<Item = IdentityId> + '_ {
        self.events.iter().filter_map(|e| match e {
            LifecycleEvent::Unloaded { id } => Some(*id),
            _ => None,
        })
    }

    pub fn consumed(&self) -> impl Iterator<Item = IdentityId> + '_ {
        self.events.iter().filter_map(|e| match e {
            LifecycleEvent::Consumed { id, .. } => Some(*id),
            _ => None,
        })
    }
}

/// Owns every tracked identity for the current session
pub struct LifecycleTracker {
    config: TrackerConfig,
    classifier: Classifier,
    resolver: IdentityResolver,
    tracked: AHashMap<ObjectAddress, TrackedIdentity>,
    ids: IdAllocator,
    history: IdentityHistory,
    outcomes: Arc<OutcomeAggregator>,
    publisher: SnapshotPublisher,
    session: SessionId,
    tick: Tick,
}

impl LifecycleTracker {
    pub fn new(config: TrackerConfig, outcomes: Arc<OutcomeAggregator>) -> Self {
        let session = SessionId::new();
        Self {
            classifier: Classifier::new(config.labels.clone()),
            resolver: IdentityResolver::new(config.match_tolerance),
            tracked: AHashMap::new(),
            ids: IdAllocator::new(),
            history: IdentityHistory::new(config.history_capacity),
            outcomes,
            publisher: SnapshotPublisher::new(TrackerSnapshot::empty(session)),
            session,
            tick: 0,
            config,
        }
    }

    /// Tracker with its own aggregator
    pub fn with_config(config: TrackerConfig) -> Self {
        Self::new(config, Arc::new(OutcomeAggregator::new()))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Number of ticks executed this session
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn outcomes(&self) -> &Arc<OutcomeAggregator> {
        &self.outcomes
    }

    pub fn history(&self) -> &IdentityHistory {
        &self.history
    }

    pub fn reader(&self) -> SnapshotReader {
        self.publisher.reader()
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn get(&self, address: ObjectAddress) -> Option<&TrackedIdentity> {
        self.tracked.get(&address)
    }

    pub fn find(&self, id: IdentityId) -> Option<&TrackedIdentity> {
        self.tracked.values().find(|i| i.id == id)
    }

    /// Start a fresh session (area change).
    ///
    /// Readers go straight from the old snapshot to an empty one.
    pub fn reset_session(&mut self) {
        self.session = SessionId::new();
        self.tracked.clear();
        self.ids = IdAllocator::new();
        self.history.clear();
        self.tick = 0;
        self.outcomes.reset();
        self.publisher.publish(TrackerSnapshot::empty(self.session));
        tracing::info!(session = %self.session, "Tracking session reset");
    }

    /// Run one scan-and-update pass
    pub fn tick<S: PerceptionSource + ?Sized>(&mut self, source: &S) -> TickReport {
        source.begin_tick();

        if source.ui_blocking_panels_open() {
            return TickReport::skipped(SkipReason::UiBlocked);
        }

        let objects = match source.enumerate_objects() {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!("Skipping tick, perception unavailable: {}", e);
                return TickReport::skipped(SkipReason::PerceptionUnavailable(e));
            }
        };

        self.tick += 1;
        let span = tracing::debug_span!("tick", session = %self.session, tick = self.tick);
        let _enter = span.enter();

        let mut report = TickReport {
            tick: Some(self.tick),
            ..Default::default()
        };

        let candidates = self.trackable(&objects);
        let observed: AHashSet<ObjectAddress> = candidates.iter().map(|h| h.address).collect();
        report.observed = candidates.len();

        for handle in candidates {
            self.update_object(source, handle, &observed, &mut report);
        }

        self.reconcile_missing(source.operator_position(), &observed, &mut report);
        self.publish();

        report
    }

    /// Valid objects, first occurrence of each address only
    fn trackable<'a>(&self, objects: &'a [ObjectHandle]) -> Vec<&'a ObjectHandle> {
        let mut seen = AHashSet::new();
        objects
            .iter()
            .filter(|h| passes_filter(h, &self.config.required_capabilities))
            .filter(|h| seen.insert(h.address))
            .collect()
    }

    fn update_object<S: PerceptionSource + ?Sized>(
        &mut self,
        source: &S,
        handle: &ObjectHandle,
        observed: &AHashSet<ObjectAddress>,
        report: &mut TickReport,
    ) {
        let resolution = self.resolver.resolve(
            &mut self.tracked,
            &mut self.ids,
            handle.address,
            handle.position,
            observed,
            self.tick,
        );
        match resolution {
            Resolution::Existing(_) => {}
            Resolution::Created(id) => {
                tracing::debug!("New identity {} at {}", id, handle.address);
                report.events.push(LifecycleEvent::Created {
                    id,
                    address: handle.address,
                });
            }
            Resolution::Rekeyed { id, from } => {
                tracing::debug!("Identity {} moved {} -> {}", id, from, handle.address);
                report.events.push(LifecycleEvent::Rekeyed {
                    id,
                    from,
                    to: handle.address,
                });
            }
        }

        let Some(identity) = self.tracked.get_mut(&handle.address) else {
            return;
        };
        identity.observe(handle.position, self.tick);

        let lines = match read_label(source, identity) {
            Ok(Some(lines)) => lines,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!("Label read failed for {}: {}", identity.id, e);
                identity.label = None;
                report.failed_reads.push((identity.id, e));
                return;
            }
        };

        let classification = self.classifier.classify(&lines);
        debug_assert!(
            classification.is_consistent(),
            "tier counts do not add up for {:?}",
            lines
        );
        if !classification.is_consistent() {
            tracing::warn!("Discarding inconsistent classification for {}", identity.id);
            return;
        }

        if let Some(verdict) = identity.apply_classification(classification) {
            report.events.push(LifecycleEvent::ActionTaken {
                id: identity.id,
                verdict,
            });
            match verdict {
                ActionVerdict::Correct => {
                    tracing::info!("Correct action on {}", identity.id);
                    self.outcomes.record(Outcome::CorrectAction);
                }
                ActionVerdict::Wrong => {
                    tracing::info!("Wrong action on {}", identity.id);
                    self.outcomes.record(Outcome::WrongAction);
                }
                ActionVerdict::Unjudged => {
                    tracing::debug!("Action on {} before it was classified", identity.id);
                }
            }
        }
    }

    /// Decide unloaded vs consumed for every identity not observed this tick
    fn reconcile_missing(
        &mut self,
        operator: Position,
        observed: &AHashSet<ObjectAddress>,
        report: &mut TickReport,
    ) {
        let mut missing: Vec<ObjectAddress> = self
            .tracked
            .keys()
            .filter(|a| !observed.contains(*a))
            .copied()
            .collect();
        missing.sort();
        let unload_distance = self.config.unload_distance;

        for address in missing {
            let Some(identity) = self.tracked.get_mut(&address) else {
                continue;
            };

            if is_out_of_range(operator, identity.last_known_position, unload_distance) {
                if !identity.unloaded {
                    identity.unloaded = true;
                    identity.label = None;
                    tracing::debug!("Identity {} out of range", identity.id);
                    report.events.push(LifecycleEvent::Unloaded { id: identity.id });
                }
                continue;
            }

            let Some(mut identity) = self.tracked.remove(&address) else {
                continue;
            };
            let missed = identity.retire_consumed();
            self.outcomes.record(Outcome::Consumed);
            if missed {
                tracing::info!("Missed opportunity on {}", identity.id);
                self.outcomes.record(Outcome::MissedOpportunity);
            } else {
                tracing::debug!("Identity {} consumed", identity.id);
            }
            report.events.push(LifecycleEvent::Consumed {
                id: identity.id,
                missed_opportunity: missed,
            });
            self.history.push(identity);
        }
    }

    fn publish(&self) {
        let mut identities: Vec<TrackedIdentity> = self.tracked.values().cloned().collect();
        identities.sort_by_key(|i| i.id);
        self.publisher.publish(TrackerSnapshot {
            session: self.session,
            tick: self.tick,
            identities,
            outcomes: self.outcomes.snapshot(),
        });
    }

    /// Identities currently recommended for action
    pub fn actionable(&self) -> impl Iterator<Item = &TrackedIdentity> {
        self.tracked
            .values()
            .filter(|i| i.recommendation == Recommendation::ActOn && !i.acted_upon)
    }
}

// Without a usable distance the object gets the benefit of the doubt
fn is_out_of_range(operator: Position, last_known: Option<Position>, unload_distance: f32) -> bool {
    match last_known {
        Some(position) if is_usable_position(operator) => operator.distance(position) > unload_distance,
        _ => true,
    }
}

/// Fetch label text, locating the label first if nothing is cached
fn read_label<S: PerceptionSource + ?Sized>(
    source: &S,
    identity: &mut TrackedIdentity,
) -> Result<Option<Vec<String>>, PerceptionError> {
    let label = match identity.label {
        Some(label) => label,
        None => match source.locate_label(identity.current_address)? {
            Some(label) => {
                identity.label = Some(label);
                label
            }
            None => return Ok(None),
        },
    };
    source.read_label(label)
}
