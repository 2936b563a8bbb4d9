//! Label classifier - turns the text lines of an object's label into
//! tier counts, marker flags and an act/leave recommendation.
//!
//! Pure: no state, no I/O. The keyword tables come from configuration.

use serde::Serialize;

use crate::core::config::{LabelTables, TIER_COUNT};

/// Which rule of the decision chain produced the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DecisionReason {
    PriorityMarker,
    Weight,
    BonusResult,
    #[default]
    BelowThreshold,
}

/// Result of classifying one label. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Classification {
    /// Whether label text was available at all
    pub valid: bool,
    /// Label says the object was already transformed and cannot be acted on again
    pub already_finalized: bool,
    /// Per-tier entry counts, lowest significance first
    pub tiers: [u32; TIER_COUNT],
    /// Entries counted into the total without a recognised tier
    pub untiered: u32,
    pub has_priority_marker: bool,
    pub has_bonus_result_marker: bool,
    pub total_weight: u32,
    pub recommended: bool,
    pub reason: DecisionReason,
}

impl Classification {
    /// Classification for a label that could not be read
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn tier_sum(&self) -> u32 {
        self.tiers.iter().sum()
    }

    /// `total_weight` must equal the tier counts plus untiered entries
    pub fn is_consistent(&self) -> bool {
        self.total_weight == self.tier_sum() + self.untiered
    }

    /// Index of the most significant tier with at least one entry
    pub fn highest_tier(&self) -> Option<usize> {
        self.tiers.iter().rposition(|&count| count > 0)
    }
}

/// Keyword-table classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    tables: LabelTables,
}

impl Classifier {
    pub fn new(tables: LabelTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &LabelTables {
        &self.tables
    }

    /// Classify a label that may not be present.
    ///
    /// An absent label is a normal state (not rendered yet) and yields
    /// `Classification::invalid()`.
    pub fn classify_label<S: AsRef<str>>(&self, lines: Option<&[S]>) -> Classification {
        match lines {
            Some(lines) => self.classify(lines),
            None => Classification::invalid(),
        }
    }

    /// Classify the text fragments of a label, in display order
    pub fn classify<S: AsRef<str>>(&self, lines: &[S]) -> Classification {
        let mut result = Classification {
            valid: true,
            ..Classification::default()
        };

        for line in lines {
            let line = line.as_ref();

            // Nothing after the finalization fragment means anything
            if contains_any(line, &self.tables.finalized_markers) {
                result.already_finalized = true;
                break;
            }

            if contains_any(line, &self.tables.priority_markers) {
                result.has_priority_marker = true;
            }
            if contains_any(line, &self.tables.bonus_result_markers) {
                result.has_bonus_result_marker = true;
            }

            if let Some(tier) = self.tier_of(line) {
                result.tiers[tier] += 1;
                result.total_weight += 1;
            } else if self.is_untiered_entry(line) {
                result.untiered += 1;
                result.total_weight += 1;
            }
        }

        result.reason = self.decide(&result);
        result.recommended = result.reason != DecisionReason::BelowThreshold;
        result
    }

    /// First matching tier keyword. The table is mutually exclusive, so at
    /// most one keyword can match a real entry name.
    fn tier_of(&self, line: &str) -> Option<usize> {
        self.tables
            .tier_keywords
            .iter()
            .position(|keyword| line.contains(keyword.as_str()))
    }

    // Counts names the tier table does not know about yet
    fn is_untiered_entry(&self, line: &str) -> bool {
        self.tables.untiered_names.iter().any(|name| name == line)
            || line.contains(self.tables.category_phrase.as_str())
    }

    fn decide(&self, c: &Classification) -> DecisionReason {
        if c.has_priority_marker {
            DecisionReason::PriorityMarker
        } else if c.total_weight >= self.tables.weight_threshold {
            DecisionReason::Weight
        } else if c.has_bonus_result_marker {
            DecisionReason::BonusResult
        } else {
            DecisionReason::BelowThreshold
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(LabelTables::default())
    }
}

fn contains_any(line: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| line.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classifier() -> Classifier {
        Classifier::default()
    }

    #[test]
    fn test_single_tiered_entry() {
        let c = classifier().classify(&["Deafening Essence of Greed"]);
        assert!(c.valid);
        assert!(!c.already_finalized);
        assert_eq!(c.tiers, [0, 0, 0, 0, 0, 1]);
        assert_eq!(c.total_weight, 1);
        assert!(!c.recommended);
        assert_eq!(c.highest_tier(), Some(5));
    }

    #[test]
    fn test_finalized_short_circuits() {
        let c = classifier().classify(&["Finalized", "Deafening Essence of Greed"]);
        assert!(c.already_finalized);
        assert_eq!(c.tiers, [0; TIER_COUNT]);
        assert_eq!(c.total_weight, 0);
        assert!(!c.recommended);
    }

    #[test]
    fn test_finalized_keeps_earlier_fragments() {
        let c = classifier().classify(&["Weeping Essence of Wrath", "Corrupted", "Wailing Essence of Fear"]);
        assert!(c.already_finalized);
        assert_eq!(c.tiers, [0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_priority_marker_wins_alone() {
        let c = classifier().classify(&["Essence of Misery"]);
        assert!(c.has_priority_marker);
        assert!(c.recommended);
        assert_eq!(c.reason, DecisionReason::PriorityMarker);
    }

    #[test]
    fn test_weight_threshold() {
        let five = vec!["Screaming Essence of Anger"; 5];
        let c = classifier().classify(&five);
        assert_eq!(c.total_weight, 5);
        assert!(!c.recommended);

        let six = vec!["Screaming Essence of Anger"; 6];
        let c = classifier().classify(&six);
        assert_eq!(c.total_weight, 6);
        assert!(c.recommended);
        assert_eq!(c.reason, DecisionReason::Weight);
    }

    #[test]
    fn test_bonus_result_marker() {
        let c = classifier().classify(&["Essence of Hysteria"]);
        assert!(c.has_bonus_result_marker);
        // exact untiered name: counted without a tier
        assert_eq!(c.untiered, 1);
        assert_eq!(c.tier_sum(), 0);
        assert_eq!(c.reason, DecisionReason::BonusResult);
        assert!(c.recommended);
    }

    #[test]
    fn test_priority_beats_bonus() {
        let c = classifier().classify(&["Essence of Horror", "Essence of Dread"]);
        assert_eq!(c.reason, DecisionReason::PriorityMarker);
    }

    #[test]
    fn test_unknown_tier_is_counted_untiered() {
        let c = classifier().classify(&["Whispering Essence of Greed"]);
        assert_eq!(c.untiered, 1);
        assert_eq!(c.total_weight, 1);
        assert!(c.is_consistent());
    }

    #[test]
    fn test_unrelated_text_is_ignored() {
        let c = classifier().classify(&["Monolith", "Press to release"]);
        assert!(c.valid);
        assert_eq!(c.total_weight, 0);
        assert!(!c.recommended);
    }

    #[test]
    fn test_absent_and_empty_labels() {
        let absent = classifier().classify_label::<&str>(None);
        assert!(!absent.valid);
        assert_eq!(absent, Classification::invalid());

        let empty: [&str; 0] = [];
        let c = classifier().classify(&empty);
        assert!(c.valid);
        assert!(!c.recommended);
    }

    #[test]
    fn test_custom_threshold() {
        let mut tables = LabelTables::default();
        tables.weight_threshold = 2;
        let c = Classifier::new(tables).classify(&["Muttering Essence of Fear", "Weeping Essence of Fear"]);
        assert!(c.recommended);
        assert_eq!(c.tiers, [1, 1, 0, 0, 0, 0]);
    }

    fn fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Finalized".to_string()),
            Just("Essence of Misery".to_string()),
            Just("Essence of Hysteria".to_string()),
            Just("Whispering Essence of Greed".to_string()),
            (0usize..TIER_COUNT).prop_map(|t| {
                format!("{} Essence of Sorrow", LabelTables::default().tier_keywords[t])
            }),
            "[a-zA-Z ]{0,24}",
        ]
    }

    proptest! {
        #[test]
        fn classify_is_deterministic(lines in prop::collection::vec(fragment(), 0..12)) {
            let c = classifier();
            prop_assert_eq!(c.classify(&lines), c.classify(&lines));
        }

        #[test]
        fn total_weight_matches_counts(lines in prop::collection::vec(fragment(), 0..12)) {
            let result = classifier().classify(&lines);
            prop_assert!(result.is_consistent());
        }

        #[test]
        fn finalized_prefix_zeroes_everything(lines in prop::collection::vec(fragment(), 0..12)) {
            let mut label = vec!["Finalized".to_string()];
            label.extend(lines);
            let result = classifier().classify(&label);
            prop_assert!(result.already_finalized);
            prop_assert_eq!(result.total_weight, 0);
            prop_assert!(!result.has_priority_marker);
        }
    }
}
