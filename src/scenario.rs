//! Scenario replay and generation
//!
//! A scenario is a list of scripted perception frames, either loaded from a
//! TOML file or generated from a seed. Generated scenarios also carry the
//! ground truth, so a run can be checked against what really happened.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classify::Classifier;
use crate::core::config::{LabelTables, TrackerConfig};
use crate::core::error::{Result, TrackerError};
use crate::outcome::OutcomeSnapshot;
use crate::perception::{ScriptedFrame, ScriptedObject, ScriptedSource};
use crate::tracking::LifecycleTracker;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frames: Vec<ScriptedFrame>,
    /// Known correct counters, when the scenario was generated
    #[serde(skip)]
    pub expected: Option<OutcomeSnapshot>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        if scenario.frames.is_empty() {
            return Err(TrackerError::Scenario(format!("scenario '{}' has no frames", scenario.name)));
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Result of running a scenario through a tracker
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub name: String,
    pub frames: usize,
    pub ticks: u64,
    pub skipped: usize,
    pub identities_created: usize,
    pub rekeys: usize,
    pub unloads: usize,
    pub failed_reads: usize,
    pub still_tracked: usize,
    pub outcomes: OutcomeSnapshot,
    pub expected: Option<OutcomeSnapshot>,
}

impl RunSummary {
    /// Whether the tracked counters match the ground truth (if known)
    pub fn matches_expected(&self) -> Option<bool> {
        self.expected.map(|expected| expected == self.outcomes)
    }
}

/// Replay every frame synchronously, one tick per frame
pub fn run(scenario: &Scenario, config: TrackerConfig) -> RunSummary {
    let mut tracker = LifecycleTracker::with_config(config);
    let source = ScriptedSource::from_frames(scenario.frames.iter().cloned());
    let mut summary = RunSummary {
        name: scenario.name.clone(),
        frames: scenario.frames.len(),
        expected: scenario.expected,
        ..Default::default()
    };

    for _ in 0..scenario.frames.len() {
        let report = tracker.tick(&source);
        if report.was_skipped() {
            summary.skipped += 1;
            continue;
        }
        summary.identities_created += report.created().count();
        summary.rekeys += report.rekeyed().count();
        summary.unloads += report.unloaded().count();
        summary.failed_reads += report.failed_reads.len();
    }

    summary.ticks = tracker.current_tick();
    summary.still_tracked = tracker.len();
    summary.outcomes = tracker.outcomes().snapshot();
    summary
}

/// Knobs for the random scenario generator
#[derive(Debug, Clone)]
pub struct GeneratorParams {
    pub seed: u64,
    pub monoliths: usize,
    /// Chance the operator follows the recommendation
    pub accuracy: f64,
    /// Chance the operator walks away and back before deciding
    pub wander_chance: f64,
    /// Chance a monolith is opened (consumed) while the operator is there
    pub consume_chance: f64,
    pub ui_block_chance: f64,
    /// Distance at which objects are enumerated at all
    pub view_range: f32,
    /// Distance between neighbouring monoliths
    pub spacing: f32,
    pub jitter: f32,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            seed: 42,
            monoliths: 20,
            accuracy: 0.8,
            wander_chance: 0.3,
            consume_chance: 0.9,
            ui_block_chance: 0.05,
            view_range: 150.0,
            spacing: 300.0,
            jitter: 0.5,
        }
    }
}

const ENTRY_NAMES: &[&str] = &[
    "Greed", "Contempt", "Hatred", "Woe", "Fear", "Anger", "Torment", "Sorrow", "Rage",
    "Suffering", "Wrath", "Doubt", "Loathing", "Zeal", "Anguish", "Spite",
];

struct Monolith {
    home: [f32; 3],
    label: Vec<String>,
    address: Option<u64>,
    consumed: bool,
}

/// Walks an operator along a row of monoliths and records what perception sees
struct Generator<'a> {
    params: &'a GeneratorParams,
    tables: &'a LabelTables,
    rng: ChaCha8Rng,
    monoliths: Vec<Monolith>,
    frames: Vec<ScriptedFrame>,
    next_address: u64,
}

impl<'a> Generator<'a> {
    fn random_label(&mut self) -> Vec<String> {
        let mut label = Vec::new();
        let entries = self.rng.gen_range(1..=8);
        for _ in 0..entries {
            let tier = &self.tables.tier_keywords[self.rng.gen_range(0..self.tables.tier_keywords.len())];
            let name = ENTRY_NAMES[self.rng.gen_range(0..ENTRY_NAMES.len())];
            label.push(format!("{} {} {}", tier, self.tables.category_phrase, name));
        }
        if !self.tables.priority_markers.is_empty() && self.rng.gen_bool(0.1) {
            let i = self.rng.gen_range(0..self.tables.priority_markers.len());
            label.push(self.tables.priority_markers[i].clone());
        }
        label
    }

    /// Record what the operator sees from `operator`
    fn snapshot(&mut self, operator: [f32; 3]) {
        let op = glam::Vec3::from_array(operator);
        let mut objects = Vec::new();

        for i in 0..self.monoliths.len() {
            let home = glam::Vec3::from_array(self.monoliths[i].home);
            let visible = !self.monoliths[i].consumed && home.distance(op) <= self.params.view_range;
            if !visible {
                // Leaving perception range invalidates the handle
                self.monoliths[i].address = None;
                continue;
            }

            let address = match self.monoliths[i].address {
                Some(address) => address,
                None => {
                    self.next_address += self.rng.gen_range(1..1_000);
                    self.monoliths[i].address = Some(self.next_address);
                    self.next_address
                }
            };

            let j = self.params.jitter;
            let position = [
                self.monoliths[i].home[0] + self.rng.gen_range(-j..=j),
                self.monoliths[i].home[1] + self.rng.gen_range(-j..=j),
                self.monoliths[i].home[2],
            ];
            let label: Vec<&str> = self.monoliths[i].label.iter().map(String::as_str).collect();
            objects.push(ScriptedObject::monolith(address, position, &label));
        }

        let frame = ScriptedFrame::new(operator, objects);
        if self.rng.gen_bool(self.params.ui_block_chance) {
            self.frames.push(ScriptedFrame {
                ui_blocked: true,
                ..frame.clone()
            });
        }
        self.frames.push(frame);
    }
}

/// Generate a scenario together with its ground-truth counters
pub fn generate(params: &GeneratorParams, tables: &LabelTables) -> Scenario {
    let classifier = Classifier::new(tables.clone());
    let mut gen = Generator {
        params,
        tables,
        rng: ChaCha8Rng::seed_from_u64(params.seed),
        monoliths: Vec::new(),
        frames: Vec::new(),
        next_address: 0x1000,
    };

    for i in 0..params.monoliths {
        let label = gen.random_label();
        gen.monoliths.push(Monolith {
            home: [i as f32 * params.spacing, 0.0, 0.0],
            label,
            address: None,
            consumed: false,
        });
    }

    let finalized = tables
        .finalized_markers
        .first()
        .cloned()
        .unwrap_or_else(|| "Corrupted".into());
    let mut expected = OutcomeSnapshot::default();

    for i in 0..params.monoliths {
        let home = gen.monoliths[i].home;
        gen.snapshot([home[0] - 100.0, 0.0, 0.0]);

        if gen.rng.gen_bool(params.wander_chance) {
            gen.snapshot([home[0] - 2.0 * params.spacing, 0.0, 0.0]);
            gen.snapshot([home[0] - 100.0, 0.0, 0.0]);
        }

        gen.snapshot([home[0], 0.0, 0.0]);

        let recommended = classifier.classify(&gen.monoliths[i].label).recommended;
        let follows = gen.rng.gen_bool(params.accuracy);
        let acts = recommended == follows;
        if acts {
            gen.monoliths[i].label.insert(0, finalized.clone());
            if recommended {
                expected.correct_actions += 1;
            } else {
                expected.wrong_actions += 1;
            }
            gen.snapshot([home[0], 0.0, 0.0]);
        }

        if gen.rng.gen_bool(params.consume_chance) {
            gen.monoliths[i].consumed = true;
            expected.consumed += 1;
            if recommended && !acts {
                expected.missed_opportunities += 1;
            }
            gen.snapshot([home[0], 0.0, 0.0]);
        }
    }

    Scenario {
        name: format!("generated-{}", params.seed),
        frames: gen.frames,
        expected: Some(expected),
    }
}
