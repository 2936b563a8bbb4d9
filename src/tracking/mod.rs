//! Identity tracking - resolution, lifecycle and the published snapshot

pub mod history;
pub mod identity;
pub mod lifecycle;
pub mod resolver;
pub mod snapshot;

pub use history::IdentityHistory;
pub use identity::{ActionVerdict, Recommendation, TrackedIdentity};
pub use lifecycle::{LifecycleEvent, LifecycleTracker, SkipReason, TickReport};
pub use resolver::{IdentityResolver, Resolution};
pub use snapshot::{SnapshotReader, TrackerSnapshot};
