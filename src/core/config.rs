//! Tracker configuration with documented defaults
//!
//! Loaded once at construction (usually from a TOML file) and never
//! mutated afterwards. Every field has a default so partial files work.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{ConfigError, Result};

/// Number of tier buckets a label can be counted into
pub const TIER_COUNT: usize = 6;

/// Configuration for the tracking pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    // === IDENTITY & LIFECYCLE ===
    /// Distance from the operator beyond which a missing object is assumed
    /// to have merely left perception range (world units)
    ///
    /// Closer than this, a missing object could not plausibly have unloaded
    /// and is treated as consumed.
    pub unload_distance: f32,

    /// Maximum distance between a reappearing object and a tracked
    /// identity's last known position for them to be considered the same
    /// object (world units)
    ///
    /// Must tolerate float jitter between loads but stay well below the
    /// spacing of two distinct objects.
    pub match_tolerance: f32,

    /// Sampling interval for the background worker (milliseconds)
    pub sample_interval_ms: u64,

    /// Number of retired identities kept for diagnostics
    pub history_capacity: usize,

    /// Capability markers an object must expose to be tracked at all
    pub required_capabilities: Vec<String>,

    // === CLASSIFICATION ===
    pub labels: LabelTables,

    // === PRESENTATION ===
    pub display: DisplayConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            unload_distance: 180.0,
            match_tolerance: 5.0,
            sample_interval_ms: 100,
            history_capacity: 64,
            required_capabilities: vec!["Monolith".into()],
            labels: LabelTables::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TrackerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, value) in [
            ("unload_distance", self.unload_distance),
            ("match_tolerance", self.match_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveDistance { name, value });
            }
        }

        // A tolerance this large would rekey objects the operator walked away from
        if self.match_tolerance >= self.unload_distance {
            return Err(ConfigError::ToleranceExceedsUnload {
                tolerance: self.match_tolerance,
                unload: self.unload_distance,
            });
        }

        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistory);
        }

        self.labels.validate()
    }
}

/// Keyword tables driving the label classifier
///
/// All matching is case-sensitive substring matching except
/// `untiered_names`, which must match a fragment exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTables {
    /// Fragments signalling the object was already transformed
    pub finalized_markers: Vec<String>,

    /// Entries that make an object worth acting on regardless of weight
    pub priority_markers: Vec<String>,

    /// Entries that can only come out of acting on the object
    pub bonus_result_markers: Vec<String>,

    /// Six mutually exclusive tier keywords, lowest significance first
    pub tier_keywords: Vec<String>,

    /// Named entries that count toward the total without a tier
    pub untiered_names: Vec<String>,

    /// Generic phrase every entry name contains
    pub category_phrase: String,

    /// Total weight at which acting becomes worthwhile
    ///
    /// At 6, six tiered entries of any tier are enough.
    pub weight_threshold: u32,
}

impl Default for LabelTables {
    fn default() -> Self {
        Self {
            finalized_markers: vec!["Finalized".into(), "Corrupted".into()],
            priority_markers: vec![
                "Essence of Misery".into(),
                "Essence of Envy".into(),
                "Essence of Dread".into(),
                "Essence of Scorn".into(),
            ],
            bonus_result_markers: vec![
                "Essence of Insanity".into(),
                "Essence of Horror".into(),
                "Essence of Delirium".into(),
                "Essence of Hysteria".into(),
            ],
            tier_keywords: vec![
                "Muttering".into(),
                "Weeping".into(),
                "Wailing".into(),
                "Screaming".into(),
                "Shrieking".into(),
                "Deafening".into(),
            ],
            untiered_names: vec![
                "Essence of Insanity".into(),
                "Essence of Horror".into(),
                "Essence of Delirium".into(),
                "Essence of Hysteria".into(),
            ],
            category_phrase: "Essence of".into(),
            weight_threshold: 6,
        }
    }
}

impl LabelTables {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.tier_keywords.len() != TIER_COUNT
            || self.tier_keywords.iter().any(|k| k.is_empty())
        {
            return Err(ConfigError::TierTable(self.tier_keywords.len()));
        }
        if self.category_phrase.is_empty() {
            return Err(ConfigError::EmptyCategoryPhrase);
        }
        Ok(())
    }
}

/// Indicator colours handed to the presentation layer (RGBA)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub priority_border: [u8; 4],
    pub priority_text: [u8; 4],
    pub normal_border: [u8; 4],
    pub normal_text: [u8; 4],
    /// Whether to draw indicators for objects already acted upon
    pub show_finalized: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            priority_border: [255, 64, 64, 255],
            priority_text: [255, 255, 255, 255],
            normal_border: [128, 128, 128, 200],
            normal_text: [220, 220, 220, 255],
            show_finalized: false,
        }
    }
}
