//! Presentation helpers - plain values for whatever draws the overlay

use crate::core::config::DisplayConfig;
use crate::outcome::OutcomeSnapshot;
use crate::tracking::{Recommendation, TrackedIdentity};

pub type Rgba = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorStyle {
    pub border_color: Rgba,
    pub text_color: Rgba,
}

/// Indicator colours for a priority or a normal object
pub fn settings_for(is_priority: bool, config: &DisplayConfig) -> IndicatorStyle {
    if is_priority {
        IndicatorStyle {
            border_color: config.priority_border,
            text_color: config.priority_text,
        }
    } else {
        IndicatorStyle {
            border_color: config.normal_border,
            text_color: config.normal_text,
        }
    }
}

/// Whether an indicator should be drawn for this identity at all
pub fn should_draw(identity: &TrackedIdentity, config: &DisplayConfig) -> bool {
    !identity.unloaded
        && identity.recommendation != Recommendation::Unclassified
        && (config.show_finalized || !identity.classification.already_finalized)
}

/// Short text drawn next to the object
pub fn indicator_text(identity: &TrackedIdentity) -> String {
    let verb = match identity.recommendation {
        Recommendation::ActOn => "CORRUPT",
        Recommendation::LeaveAlone => "LEAVE",
        Recommendation::Unclassified => "?",
    };
    let c = &identity.classification;
    if c.has_priority_marker {
        format!("{} (priority)", verb)
    } else {
        format!("{} ({})", verb, c.total_weight)
    }
}

/// One-line stats panel text
pub fn stats_line(stats: &OutcomeSnapshot) -> String {
    let accuracy = stats
        .accuracy()
        .map(|a| format!("{:.0}%", a * 100.0))
        .unwrap_or_else(|| "-".into());
    format!(
        "correct {} | wrong {} | missed {} | consumed {} | accuracy {}",
        stats.correct_actions, stats.wrong_actions, stats.missed_opportunities, stats.consumed, accuracy
    )
}
