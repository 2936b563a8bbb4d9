//! Outcome counters for one tracking session
//!
//! Incremented from the tick worker and read from the render pass. Counters
//! live in a block of atomics behind an `Arc`; `reset` swaps in a fresh block,
//! so a reader holding the old block sees old values and a reader taking the
//! new block sees zeros. No reader can see a half-cleared set.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Something the operator did (or failed to do) to a tracked object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    /// Acted on an object the recommendation said to act on
    CorrectAction,
    /// Acted on an object the recommendation said to leave alone
    WrongAction,
    /// An object worth acting on was consumed without being acted on
    MissedOpportunity,
    /// An object was consumed (any reason)
    Consumed,
}

#[derive(Debug, Default)]
struct Counters {
    correct: AtomicU64,
    wrong: AtomicU64,
    missed: AtomicU64,
    consumed: AtomicU64,
}

impl Counters {
    fn slot(&self, outcome: Outcome) -> &AtomicU64 {
        match outcome {
            Outcome::CorrectAction => &self.correct,
            Outcome::WrongAction => &self.wrong,
            Outcome::MissedOpportunity => &self.missed,
            Outcome::Consumed => &self.consumed,
        }
    }
}

/// Thread-safe outcome counters
#[derive(Debug, Default)]
pub struct OutcomeAggregator {
    counters: RwLock<Arc<Counters>>,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // The lock only guards the pointer; it is never held across user code
    fn current(&self) -> Arc<Counters> {
        match self.counters.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn record(&self, outcome: Outcome) {
        self.current().slot(outcome).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, outcome: Outcome) -> u64 {
        self.current().slot(outcome).load(Ordering::Relaxed)
    }

    pub fn correct_actions(&self) -> u64 {
        self.get(Outcome::CorrectAction)
    }

    pub fn wrong_actions(&self) -> u64 {
        self.get(Outcome::WrongAction)
    }

    pub fn missed_opportunities(&self) -> u64 {
        self.get(Outcome::MissedOpportunity)
    }

    pub fn consumed(&self) -> u64 {
        self.get(Outcome::Consumed)
    }

    /// Read all four counters from the same counter block
    pub fn snapshot(&self) -> OutcomeSnapshot {
        let counters = self.current();
        OutcomeSnapshot {
            correct_actions: counters.correct.load(Ordering::Relaxed),
            wrong_actions: counters.wrong.load(Ordering::Relaxed),
            missed_opportunities: counters.missed.load(Ordering::Relaxed),
            consumed: counters.consumed.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter in one step
    pub fn reset(&self) {
        let fresh = Arc::new(Counters::default());
        match self.counters.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }
}

/// Point-in-time copy of the counters; ratios are derived on read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSnapshot {
    pub correct_actions: u64,
    pub wrong_actions: u64,
    pub missed_opportunities: u64,
    pub consumed: u64,
}

impl OutcomeSnapshot {
    pub fn total_actions(&self) -> u64 {
        self.correct_actions + self.wrong_actions
    }

    /// Share of actions that matched the recommendation
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.correct_actions, self.total_actions())
    }

    /// Correct actions per consumed object
    pub fn correct_ratio(&self) -> Option<f64> {
        ratio(self.correct_actions, self.consumed)
    }

    /// Missed opportunities per consumed object
    pub fn missed_ratio(&self) -> Option<f64> {
        ratio(self.missed_opportunities, self.consumed)
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}
