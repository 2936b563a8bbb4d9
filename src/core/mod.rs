pub mod config;
pub mod error;
pub mod types;

pub use config::{DisplayConfig, LabelTables, TrackerConfig, TIER_COUNT};
pub use error::{ConfigError, PerceptionError, Result, TrackerError};
pub use types::{IdAllocator, IdentityId, ObjectAddress, Position, SessionId, Tick};
