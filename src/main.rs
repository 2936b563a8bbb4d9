//! Essence Tracker - Entry Point
//!
//! Replays recorded or generated perception scenarios through the tracker
//! and prints the resulting outcome counters.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use essence_tracker::core::config::TrackerConfig;
use essence_tracker::core::error::{Result, TrackerError};
use essence_tracker::display::stats_line;
use essence_tracker::perception::ScriptedSource;
use essence_tracker::scenario::{self, GeneratorParams, RunSummary, Scenario};
use essence_tracker::scheduler::TrackerWorker;
use essence_tracker::tracking::LifecycleTracker;

/// Essence monolith tracker - offline replay and simulation
#[derive(Parser, Debug)]
#[command(name = "essence-tracker")]
#[command(about = "Track essence monoliths through a sampled perception feed")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario file (TOML list of frames)
    Replay {
        scenario: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Generate a random scenario and run it
    Simulate {
        /// Random seed for deterministic runs
        #[arg(long)]
        seed: Option<u64>,

        /// Number of monoliths along the operator's path
        #[arg(long, default_value_t = 20)]
        monoliths: usize,

        /// Chance the operator follows the recommendation
        #[arg(long, default_value_t = 0.8)]
        accuracy: f64,

        /// Run through the background worker instead of ticking inline
        #[arg(long)]
        live: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Tracker configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

impl CommonArgs {
    fn load_config(&self) -> Result<TrackerConfig> {
        match &self.config {
            Some(path) => TrackerConfig::load(path),
            None => Ok(TrackerConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay { scenario, common } => {
            let config = common.load_config()?;
            let scenario = Scenario::load(&scenario)?;
            tracing::info!("Replaying '{}' ({} frames)", scenario.name, scenario.frames.len());
            let summary = scenario::run(&scenario, config);
            print_summary(&summary, common.json)?;
        }
        Command::Simulate {
            seed,
            monoliths,
            accuracy,
            live,
            common,
        } => {
            let config = common.load_config()?;
            let params = GeneratorParams {
                seed: seed.unwrap_or_else(|| rand::random()),
                monoliths,
                accuracy: accuracy.clamp(0.0, 1.0),
                ..Default::default()
            };
            tracing::info!("Generating scenario with seed {}", params.seed);
            let scenario = scenario::generate(&params, &config.labels);

            let summary = if live {
                run_live(&scenario, config)?
            } else {
                scenario::run(&scenario, config)
            };
            print_summary(&summary, common.json)?;
        }
    }

    Ok(())
}

/// Drive the scenario through the background worker, one frame per tick
fn run_live(scenario: &Scenario, config: TrackerConfig) -> Result<RunSummary> {
    let rt = Runtime::new()?;
    let interval = Duration::from_millis(config.sample_interval_ms);

    rt.block_on(async {
        let source = Arc::new(ScriptedSource::from_frames(scenario.frames.iter().cloned()));
        let worker = TrackerWorker::spawn(LifecycleTracker::with_config(config), Arc::clone(&source));

        while source.remaining_frames() > 0 {
            tokio::time::sleep(interval).await;
            tracing::debug!("{}", stats_line(&worker.reader().load().outcomes));
        }
        // Let the last frame be processed
        tokio::time::sleep(interval * 2).await;

        let tracker = worker
            .shutdown()
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        Ok::<_, TrackerError>(RunSummary {
            name: scenario.name.clone(),
            frames: scenario.frames.len(),
            ticks: tracker.current_tick(),
            still_tracked: tracker.len(),
            outcomes: tracker.outcomes().snapshot(),
            expected: scenario.expected,
            ..Default::default()
        })
    })
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("\n=== {} ===", summary.name);
    println!("Frames:        {}", summary.frames);
    println!("Ticks:         {} ({} skipped)", summary.ticks, summary.skipped);
    println!("Identities:    {} created, {} rekeyed, {} unloads", summary.identities_created, summary.rekeys, summary.unloads);
    println!("Still tracked: {}", summary.still_tracked);
    println!("Failed reads:  {}", summary.failed_reads);
    println!("{}", stats_line(&summary.outcomes));
    if let Some(expected) = summary.expected {
        let verdict = if summary.matches_expected() == Some(true) { "match" } else { "MISMATCH" };
        println!("Expected:      {} ({})", stats_line(&expected), verdict);
    }
    Ok(())
}
