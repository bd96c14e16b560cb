//! Fixed-rate headless simulation loop.

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use map_procedures_core::{
    Command, Event, MessagesSender, MovementState, TimePoint, WallPositionMessage,
};
use map_procedures_system_replication::{encode, Replication};
use map_procedures_world::{self as world, query, World};

use crate::scenario::Scenario;

/// Parameters of a headless run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RunConfig {
    /// Ticks simulated per second.
    pub(crate) tick_rate: u32,
    /// Simulated seconds to cover.
    pub(crate) duration_s: f64,
    /// Interval between wall summaries in ticks; zero disables them.
    pub(crate) dump_every: u64,
}

impl RunConfig {
    fn tick_count(&self) -> u64 {
        (self.duration_s * f64::from(self.tick_rate)).ceil() as u64
    }
}

/// Totals gathered over a headless run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    /// Ticks simulated.
    pub(crate) ticks: u64,
    /// Procedures started by scripted actor positions.
    pub(crate) procedures_started: u64,
    /// State transitions made by procedures.
    pub(crate) transitions: u64,
    /// Wall position messages encoded for the transport.
    pub(crate) messages: u64,
    /// Encoded payload bytes.
    pub(crate) bytes: u64,
    /// Procedures still away from their idle state when the run ended.
    pub(crate) active_at_end: usize,
}

impl RunSummary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { .. } => self.ticks += 1,
                Event::ProcedureStarted { .. } => self.procedures_started += 1,
                Event::ProcedureStateChanged { .. } => self.transitions += 1,
            }
        }
    }
}

/// Sender that encodes every message and keeps transport statistics.
#[derive(Debug, Default)]
struct EncodingSink {
    messages: u64,
    bytes: u64,
}

impl MessagesSender for EncodingSink {
    fn send_unreliable(&mut self, message: &WallPositionMessage) {
        match encode(message) {
            Ok(payload) => {
                self.messages += 1;
                self.bytes += payload.len() as u64;
            }
            Err(error) => {
                tracing::warn!(%error, wall = message.wall_index, "wall position dropped");
            }
        }
    }
}

/// Replays `scenario` at the configured rate and returns the run totals.
pub(crate) fn run(scenario: &Scenario, config: &RunConfig) -> Result<RunSummary> {
    ensure!(config.tick_rate > 0, "tick rate must be positive");
    ensure!(
        config.duration_s.is_finite() && config.duration_s >= 0.0,
        "duration must be a non-negative number of seconds"
    );

    let map = scenario.map_data();
    let mut world = World::new(&map).context("scenario map data is inconsistent")?;
    let mut replication = Replication::new();
    let mut sink = EncodingSink::default();
    let mut summary = RunSummary::default();
    let mut events = Vec::new();
    let mut pending = scenario.actor_positions.iter().peekable();

    let dt = Duration::from_secs(1) / config.tick_rate;
    let ticks = config.tick_count();
    tracing::info!(
        ticks,
        tick_rate = config.tick_rate,
        procedures = map.procedures().len(),
        dynamic_walls = map.dynamic_walls().len(),
        "simulation started"
    );

    let mut now = TimePoint::ZERO;
    for tick in 1..=ticks {
        now = now.saturating_add(dt);
        while let Some(scripted) = pending.next_if(|scripted| scripted.time() <= now) {
            world::apply(
                &mut world,
                Command::ActorPosition {
                    time: scripted.time(),
                    position: scripted.position(),
                },
                &mut events,
            );
        }
        world::apply(&mut world, Command::Tick { now, dt }, &mut events);
        replication.handle(query::wall_view(&world), &mut sink);

        summary.record(&events);
        events.clear();

        if config.dump_every > 0 && tick % config.dump_every == 0 {
            dump_state(&world, tick);
        }
    }

    summary.messages = sink.messages;
    summary.bytes = sink.bytes;
    summary.active_at_end = active_procedures(&world);
    Ok(summary)
}

fn active_procedures(world: &World<'_>) -> usize {
    query::procedure_view(world)
        .iter()
        .filter(|snapshot| snapshot.state != MovementState::Idle)
        .count()
}

fn dump_state(world: &World<'_>, tick: u64) {
    tracing::info!(
        tick,
        active_procedures = active_procedures(world),
        "simulation progress"
    );
    for snapshot in query::procedure_view(world).iter() {
        tracing::debug!(
            procedure = snapshot.id.get(),
            state = ?snapshot.state,
            stage = snapshot.absolute_stage,
            "procedure"
        );
    }
    for (index, wall) in query::wall_view(world).iter() {
        tracing::debug!(
            wall = index.get(),
            vertices = ?wall.vertices,
            z = wall.z,
            "dynamic wall"
        );
    }
}
