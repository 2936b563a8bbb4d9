//! Background tick worker
//!
//! Runs `LifecycleTracker::tick` on a tokio task at the configured sampling
//! interval. A tick runs to completion before the next command is looked at,
//! so a reset or shutdown never lands in the middle of a pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::outcome::OutcomeAggregator;
use crate::perception::PerceptionSource;
use crate::tracking::{LifecycleTracker, SnapshotReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Area change: drop all tracking state
    ResetSession,
    Shutdown,
}

pub struct TrackerWorker {
    commands: mpsc::UnboundedSender<WorkerCommand>,
    reader: SnapshotReader,
    outcomes: Arc<OutcomeAggregator>,
    passes: Arc<AtomicU64>,
    task: JoinHandle<LifecycleTracker>,
}

impl TrackerWorker {
    /// Start ticking on the current tokio runtime
    pub fn spawn<S>(mut tracker: LifecycleTracker, source: S) -> Self
    where
        S: PerceptionSource + Send + 'static,
    {
        let (commands, mut inbox) = mpsc::unbounded_channel();
        let reader = tracker.reader();
        let outcomes = Arc::clone(tracker.outcomes());
        let passes = Arc::new(AtomicU64::new(0));
        let interval = Duration::from_millis(tracker.config().sample_interval_ms.max(1));

        let task = {
            let passes = Arc::clone(&passes);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        command = inbox.recv() => match command {
                            Some(WorkerCommand::ResetSession) => tracker.reset_session(),
                            Some(WorkerCommand::Shutdown) | None => break,
                        },
                        _ = ticker.tick() => {
                            let report = tracker.tick(&source);
                            passes.fetch_add(1, Ordering::Relaxed);
                            if !report.events.is_empty() {
                                tracing::debug!("Tick {:?}: {} events", report.tick, report.events.len());
                            }
                        }
                    }
                }

                tracing::info!("Tracker worker stopped after {} passes", passes.load(Ordering::Relaxed));
                tracker
            })
        };

        Self {
            commands,
            reader,
            outcomes,
            passes,
            task,
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    pub fn outcomes(&self) -> &Arc<OutcomeAggregator> {
        &self.outcomes
    }

    /// Tick passes attempted so far, skipped ones included
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn reset_session(&self) {
        // A closed channel means the worker already stopped
        let _ = self.commands.send(WorkerCommand::ResetSession);
    }

    /// Stop the worker and hand the tracker back
    pub async fn shutdown(self) -> Result<LifecycleTracker, tokio::task::JoinError> {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        self.task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TrackerConfig;
    use crate::core::types::IdentityId;
    use crate::perception::{ScriptedFrame, ScriptedObject, ScriptedSource};

    fn fast_config() -> TrackerConfig {
        TrackerConfig {
            sample_interval_ms: 5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_worker_ticks_and_publishes() {
        let source = Arc::new(ScriptedSource::new());
        source.set_frame(ScriptedFrame::new(
            [0.0; 3],
            vec![ScriptedObject::monolith(100, [1.0, 0.0, 0.0], &["Essence of Misery"])],
        ));

        let worker = TrackerWorker::spawn(LifecycleTracker::with_config(fast_config()), Arc::clone(&source));
        tokio::time::sleep(Duration::from_millis(60)).await;

        let snapshot = worker.reader().load();
        assert!(snapshot.tick >= 1);
        assert_eq!(snapshot.identities.len(), 1);
        assert_eq!(snapshot.identities[0].id, IdentityId(1));
        assert!(worker.passes() >= 1);

        let tracker = worker.shutdown().await.unwrap();
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn test_worker_reset_session() {
        let source = Arc::new(ScriptedSource::new());
        source.set_frame(ScriptedFrame::new(
            [0.0; 3],
            vec![ScriptedObject::monolith(100, [1.0, 0.0, 0.0], &["Essence of Misery"])],
        ));
        let worker = TrackerWorker::spawn(LifecycleTracker::with_config(fast_config()), Arc::clone(&source));
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Object consumed while the operator stands next to it
        source.set_frame(ScriptedFrame::new([0.0; 3], vec![]));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(worker.outcomes().missed_opportunities(), 1);

        let before = worker.reader().load().session;
        worker.reset_session();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let snapshot = worker.reader().load();
        assert_ne!(snapshot.session, before);
        assert!(snapshot.is_empty());
        assert_eq!(worker.outcomes().missed_opportunities(), 0);
        worker.shutdown().await.unwrap();
    }
}
