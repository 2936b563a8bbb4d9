use thiserror::Error;

use crate::core::types::ObjectAddress;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Perception error: {0}")]
    Perception(#[from] PerceptionError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

/// Configuration rejected by `TrackerConfig::validate`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveDistance { name: &'static str, value: f32 },

    #[error("match_tolerance ({tolerance}) must be smaller than unload_distance ({unload})")]
    ToleranceExceedsUnload { tolerance: f32, unload: f32 },

    #[error("sample_interval_ms must be at least 1")]
    ZeroInterval,

    #[error("history_capacity must be at least 1")]
    ZeroHistory,

    #[error("tier table needs exactly 6 non-empty keywords, got {0}")]
    TierTable(usize),

    #[error("category_phrase must not be empty")]
    EmptyCategoryPhrase,
}

/// Failure reading a single object from the perception layer.
///
/// These are transient by nature: the object may have unloaded between
/// enumeration and the read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerceptionError {
    #[error("object {0} is gone")]
    ObjectGone(ObjectAddress),

    #[error("failed to read {0}: {1}")]
    ReadFailed(ObjectAddress, String),

    #[error("perception unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
