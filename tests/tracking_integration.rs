//! Integration tests for the tracking pipeline through the public API

use essence_tracker::core::config::TrackerConfig;
use essence_tracker::core::types::{IdentityId, ObjectAddress};
use essence_tracker::outcome::OutcomeAggregator;
use essence_tracker::perception::{ScriptedFrame, ScriptedObject, ScriptedSource};
use essence_tracker::tracking::{ActionVerdict, LifecycleEvent, LifecycleTracker, Recommendation};
use std::sync::Arc;

const NEARBY: [f32; 3] = [3.0, 4.0, 0.0];

fn setup() -> (LifecycleTracker, ScriptedSource, Arc<OutcomeAggregator>) {
    let outcomes = Arc::new(OutcomeAggregator::new());
    let tracker = LifecycleTracker::new(TrackerConfig::default(), Arc::clone(&outcomes));
    (tracker, ScriptedSource::new(), outcomes)
}

#[test]
fn test_three_tick_wrong_action_scenario() {
    let (mut tracker, source, outcomes) = setup();

    // Tick 1: a single low-value monolith
    source.set_frame(ScriptedFrame::new(
        NEARBY,
        vec![ScriptedObject::monolith(100, [0.0, 0.0, 0.0], &["Deafening Essence of Greed"])],
    ));
    tracker.tick(&source);
    let identity = tracker.get(ObjectAddress(100)).expect("tracked after tick 1");
    assert_eq!(identity.id, IdentityId(1));
    assert_eq!(identity.classification.total_weight, 1);
    assert!(!identity.classification.recommended);

    // Tick 2: the operator acts on it anyway
    source.set_frame(ScriptedFrame::new(
        NEARBY,
        vec![ScriptedObject::monolith(100, [0.0, 0.0, 0.0], &["Finalized"])],
    ));
    let report = tracker.tick(&source);
    assert!(report.events.contains(&LifecycleEvent::ActionTaken {
        id: IdentityId(1),
        verdict: ActionVerdict::Wrong,
    }));
    let identity = tracker.get(ObjectAddress(100)).unwrap();
    assert!(identity.acted_upon);
    assert!(identity.wrong_action);
    assert_eq!(outcomes.wrong_actions(), 1);

    // Tick 3: gone while the operator stands next to it
    source.set_frame(ScriptedFrame::new(NEARBY, vec![]));
    let report = tracker.tick(&source);
    assert!(report.events.contains(&LifecycleEvent::Consumed {
        id: IdentityId(1),
        missed_opportunity: false,
    }));
    assert!(tracker.get(ObjectAddress(100)).is_none());
    assert!(tracker.history().find(IdentityId(1)).unwrap().consumed);
    assert_eq!(outcomes.missed_opportunities(), 0);
    assert_eq!(outcomes.consumed(), 1);
}

#[test]
fn test_correct_action_counted() {
    let (mut tracker, source, outcomes) = setup();
    let six = ["Muttering Essence of Fear"; 6];
    source.set_frame(ScriptedFrame::new(NEARBY, vec![ScriptedObject::monolith(7, [0.0; 3], &six)]));
    tracker.tick(&source);
    assert_eq!(tracker.get(ObjectAddress(7)).unwrap().recommendation, Recommendation::ActOn);

    source.set_frame(ScriptedFrame::new(
        NEARBY,
        vec![ScriptedObject::monolith(7, [0.0; 3], &["Corrupted", "Essence of Insanity"])],
    ));
    tracker.tick(&source);
    source.set_frame(ScriptedFrame::new(NEARBY, vec![]));
    tracker.tick(&source);

    let stats = outcomes.snapshot();
    assert_eq!(stats.correct_actions, 1);
    assert_eq!(stats.wrong_actions, 0);
    assert_eq!(stats.missed_opportunities, 0);
    assert_eq!(stats.consumed, 1);
    assert_eq!(stats.correct_ratio(), Some(1.0));
}

#[test]
fn test_identity_survives_address_change() {
    let (mut tracker, source, _) = setup();
    let label = ["Wailing Essence of Spite"];

    source.set_frame(ScriptedFrame::new([0.0; 3], vec![ScriptedObject::monolith(0xA0, [120.0, 30.0, 2.0], &label)]));
    tracker.tick(&source);

    // Out of range for a few ticks
    source.set_frame(ScriptedFrame::new([-400.0, 0.0, 0.0], vec![]));
    for _ in 0..3 {
        tracker.tick(&source);
    }
    assert!(tracker.get(ObjectAddress(0xA0)).unwrap().unloaded);

    source.set_frame(ScriptedFrame::new(
        [0.0; 3],
        vec![ScriptedObject::monolith(0xB0, [121.0, 29.5, 2.0], &label)],
    ));
    let report = tracker.tick(&source);
    assert_eq!(report.created().count(), 0);

    let identity = tracker.get(ObjectAddress(0xB0)).unwrap();
    assert_eq!(identity.id, IdentityId(1));
    assert_eq!(identity.current_address, ObjectAddress(0xB0));
    assert_eq!(identity.first_seen, 1);
    assert_eq!(identity.last_seen, 5);
}

#[test]
fn test_unload_threshold_decides_fate() {
    let config = TrackerConfig {
        unload_distance: 100.0,
        ..Default::default()
    };

    // Operator just beyond the threshold: kept
    let mut tracker = LifecycleTracker::with_config(config.clone());
    let source = ScriptedSource::new();
    source.set_frame(ScriptedFrame::new([0.0; 3], vec![ScriptedObject::monolith(1, [0.0; 3], &["Essence of Envy"])]));
    tracker.tick(&source);
    source.set_frame(ScriptedFrame::new([100.5, 0.0, 0.0], vec![]));
    tracker.tick(&source);
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.outcomes().consumed(), 0);

    // Operator just inside the threshold: consumed and missed
    let mut tracker = LifecycleTracker::with_config(config);
    source.set_frame(ScriptedFrame::new([0.0; 3], vec![ScriptedObject::monolith(1, [0.0; 3], &["Essence of Envy"])]));
    tracker.tick(&source);
    source.set_frame(ScriptedFrame::new([99.5, 0.0, 0.0], vec![]));
    tracker.tick(&source);
    assert!(tracker.is_empty());
    assert_eq!(tracker.outcomes().missed_opportunities(), 1);
}

#[test]
fn test_unloaded_then_consumed_on_return() {
    let (mut tracker, source, outcomes) = setup();
    source.set_frame(ScriptedFrame::new([0.0; 3], vec![ScriptedObject::monolith(1, [0.0; 3], &["Essence of Scorn"])]));
    tracker.tick(&source);

    source.set_frame(ScriptedFrame::new([1_000.0, 0.0, 0.0], vec![]));
    tracker.tick(&source);
    assert_eq!(outcomes.consumed(), 0);

    // Back next to where it stood and it is not there any more
    source.set_frame(ScriptedFrame::new([1.0, 0.0, 0.0], vec![]));
    tracker.tick(&source);
    assert_eq!(outcomes.consumed(), 1);
    assert_eq!(outcomes.missed_opportunities(), 1);
}

#[test]
fn test_new_ids_are_never_reused() {
    let (mut tracker, source, _) = setup();
    let mut seen = Vec::new();
    for round in 0..4u64 {
        source.set_frame(ScriptedFrame::new(
            [0.0; 3],
            vec![ScriptedObject::monolith(round + 1, [round as f32 * 50.0, 0.0, 0.0], &[])],
        ));
        let report = tracker.tick(&source);
        seen.extend(report.created());
        source.set_frame(ScriptedFrame::new([round as f32 * 50.0, 0.0, 0.0], vec![]));
        tracker.tick(&source);
    }
    assert_eq!(seen, vec![IdentityId(1), IdentityId(2), IdentityId(3), IdentityId(4)]);
}

#[test]
fn test_reader_snapshot_is_isolated_from_later_ticks() {
    let (mut tracker, source, _) = setup();
    let reader = tracker.reader();
    source.set_frame(ScriptedFrame::new(NEARBY, vec![ScriptedObject::monolith(1, [0.0; 3], &["Essence of Misery"])]));
    tracker.tick(&source);
    let held = reader.load();

    source.set_frame(ScriptedFrame::new(NEARBY, vec![]));
    tracker.tick(&source);

    assert_eq!(held.len(), 1);
    assert!(reader.load().is_empty());
    assert_eq!(reader.load().outcomes.missed_opportunities, 1);
}
