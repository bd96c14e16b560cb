#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative procedure and dynamic wall state for a loaded map.
//!
//! The world borrows the immutable [`MapData`] for its whole lifetime and owns
//! one procedure state per procedure plus one entry per dynamic wall. All
//! mutation flows through [`apply`]; readers use the [`query`] module between
//! ticks.

mod validation;

use std::time::Duration;

use glam::Vec3;
use map_procedures_core::{
    CellCoord, Command, DynamicWall, Event, Link, MapData, ProcedureId, TimePoint,
};
use map_procedures_system_actions::Script;
use map_procedures_system_procedures::{ProcedureState, Timing};

pub use validation::MapError;

/// Represents the authoritative state of every procedure and dynamic wall.
#[derive(Debug)]
pub struct World<'map> {
    map: &'map MapData,
    procedures: Vec<ProcedureState>,
    timings: Vec<Timing>,
    scripts: Vec<Script>,
    walls: Vec<DynamicWall>,
    tick_index: u64,
}

impl<'map> World<'map> {
    /// Creates a world for the provided map with every procedure idle and
    /// every dynamic wall resting at its static position.
    pub fn new(map: &'map MapData) -> Result<Self, MapError> {
        validation::validate(map)?;

        let definitions = map.procedures();
        let world = Self {
            map,
            procedures: vec![ProcedureState::new(); definitions.len()],
            timings: definitions.iter().map(Timing::of).collect(),
            scripts: definitions.iter().map(Script::compile).collect(),
            walls: map
                .dynamic_walls()
                .iter()
                .map(|geometry| DynamicWall::at_rest(geometry.vertices))
                .collect(),
            tick_index: 0,
        };

        tracing::debug!(
            procedures = world.procedures.len(),
            dynamic_walls = world.walls.len(),
            "world constructed"
        );
        Ok(world)
    }

    fn process_actor_position(
        &mut self,
        time: TimePoint,
        position: Vec3,
        out_events: &mut Vec<Event>,
    ) {
        let Some(cell) = CellCoord::from_position(position) else {
            tracing::trace!(?position, "actor position outside the map ignored");
            return;
        };

        let Link::Floor(procedure) = self.map.link(cell) else {
            return;
        };

        let state = &mut self.procedures[procedure.get() as usize];
        if state.start(time) {
            tracing::debug!(procedure = procedure.get(), ?cell, "procedure started");
            out_events.push(Event::ProcedureStarted { procedure, cell });
        } else {
            tracing::trace!(
                procedure = procedure.get(),
                state = ?state.state(),
                "floor trigger ignored for busy procedure"
            );
        }
    }

    fn tick(&mut self, now: TimePoint, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { now, dt });

        for (position, state) in self.procedures.iter_mut().enumerate() {
            let procedure = ProcedureId::new(position as u32);
            if let Some(transition) = state.advance(self.timings[position], now, dt) {
                tracing::debug!(
                    procedure = procedure.get(),
                    from = ?transition.from,
                    to = ?transition.to,
                    "procedure transitioned"
                );
                out_events.push(Event::ProcedureStateChanged {
                    procedure,
                    from: transition.from,
                    to: transition.to,
                });
            }

            let stage = state.absolute_action_stage();
            debug_assert!(
                (0.0..=1.0).contains(&stage),
                "absolute action stage {stage} escaped [0, 1]"
            );
            self.scripts[position].apply(stage, self.map, &mut self.walls);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World<'_>, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ActorPosition { time, position } => {
            world.process_actor_position(time, position, out_events);
        }
        Command::Tick { now, dt } => world.tick(now, dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use map_procedures_core::{
        DynamicWall, MapData, ProcedureId, ProcedureSnapshot, ProcedureView, WallIndex, WallView,
    };

    /// Provides read-only access to the static map the world was built from.
    #[must_use]
    pub fn map_data<'map>(world: &World<'map>) -> &'map MapData {
        world.map
    }

    /// Number of ticks processed since construction.
    #[must_use]
    pub fn tick_index(world: &World<'_>) -> u64 {
        world.tick_index
    }

    /// Exposes a read-only view of the dynamic wall store.
    #[must_use]
    pub fn wall_view<'world>(world: &'world World<'_>) -> WallView<'world> {
        WallView::new(&world.walls)
    }

    /// Returns the current geometry of a single dynamic wall.
    #[must_use]
    pub fn dynamic_wall<'world>(
        world: &'world World<'_>,
        index: WallIndex,
    ) -> Option<&'world DynamicWall> {
        world.walls.get(index.get() as usize)
    }

    /// Captures the state of a single procedure.
    #[must_use]
    pub fn procedure(world: &World<'_>, id: ProcedureId) -> Option<ProcedureSnapshot> {
        world
            .procedures
            .get(id.get() as usize)
            .map(|state| state.snapshot(id))
    }

    /// Captures a read-only view of every procedure.
    #[must_use]
    pub fn procedure_view(world: &World<'_>) -> ProcedureView {
        let snapshots = world
            .procedures
            .iter()
            .enumerate()
            .map(|(position, state)| state.snapshot(ProcedureId::new(position as u32)))
            .collect();
        ProcedureView::from_snapshots(snapshots)
    }
}
