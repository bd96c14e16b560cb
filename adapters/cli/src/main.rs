#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays map procedure scenarios headlessly.

mod scenario;
mod simulation;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{
    scenario::Scenario,
    simulation::{RunConfig, RunSummary},
};

/// Command-line arguments accepted by the simulation binary.
#[derive(Debug, Parser)]
#[command(name = "map-procedures")]
#[command(about = "Replays map procedure scenarios without a renderer")]
struct Args {
    /// Path to the JSON scenario file.
    #[arg(long)]
    scenario: PathBuf,
    /// Simulation ticks per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    tick_rate: u32,
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,
    /// Log a wall-state summary every N ticks; zero disables it.
    #[arg(long, default_value_t = 30)]
    dump_every: u64,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            tick_rate: self.tick_rate,
            duration_s: self.duration,
            dump_every: self.dump_every,
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Entry point for the map procedures command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let scenario = Scenario::load(&args.scenario)?;
    let RunSummary {
        ticks,
        procedures_started,
        transitions,
        messages,
        bytes,
        active_at_end,
    } = simulation::run(&scenario, &args.run_config())?;

    tracing::info!(
        ticks,
        procedures_started,
        transitions,
        messages,
        bytes,
        active_at_end,
        "simulation finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::try_parse_from(["map-procedures", "--scenario", "door.json"])
            .expect("arguments parse");
        assert_eq!(args.scenario, PathBuf::from("door.json"));
        assert_eq!(
            args.run_config(),
            RunConfig {
                tick_rate: 60,
                duration_s: 10.0,
                dump_every: 30,
            }
        );
    }

    #[test]
    fn overrides_are_forwarded_to_the_run() {
        let args = Args::try_parse_from([
            "map-procedures",
            "--scenario",
            "lift.json",
            "--tick-rate",
            "20",
            "--duration",
            "2.5",
            "--dump-every",
            "0",
        ])
        .expect("arguments parse");
        assert_eq!(
            args.run_config(),
            RunConfig {
                tick_rate: 20,
                duration_s: 2.5,
                dump_every: 0,
            }
        );
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let parsed =
            Args::try_parse_from(["map-procedures", "--scenario", "a.json", "--tick-rate", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn scenario_is_required() {
        assert!(Args::try_parse_from(["map-procedures"]).is_err());
    }
}
