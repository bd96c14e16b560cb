#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the map procedure engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing actor positions and clock advances, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing procedure transitions. Replication consumers read immutable
//! [`WallView`] snapshots and emit [`WallPositionMessage`] payloads through a
//! [`MessagesSender`].

use std::time::Duration;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub mod map_data;

pub use map_data::{
    ActionCommand, ActionCommandId, IndexElement, Link, MapData, Procedure, WallGeometry,
    ACTION_COMMAND_ARGS,
};

/// Number of cells along each edge of the square map grid.
pub const MAP_SIZE: u32 = 64;

/// Number of fixed-point units that compose a single world unit on the wire.
pub const FIXED_POINT_SCALE: f32 = 256.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Reports the current position of an actor so floor triggers can fire.
    ActorPosition {
        /// Simulation time at which the position was sampled.
        time: TimePoint,
        /// World-space position of the actor.
        position: Vec3,
    },
    /// Advances every procedure and re-evaluates the geometry it drives.
    Tick {
        /// Simulation time at the end of the tick.
        now: TimePoint,
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Simulation time at the end of the tick.
        now: TimePoint,
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a floor trigger started an idle procedure.
    ProcedureStarted {
        /// Procedure that left the idle state.
        procedure: ProcedureId,
        /// Cell whose floor link fired the procedure.
        cell: CellCoord,
    },
    /// Reports a lifecycle transition performed while ticking a procedure.
    ProcedureStateChanged {
        /// Procedure that transitioned.
        procedure: ProcedureId,
        /// State held before the tick.
        from: MovementState,
        /// State held after the tick.
        to: MovementState,
    },
}

/// Lifecycle of a single procedure.
///
/// The cycle is `Idle -> Movement -> BackWait -> ReverseMovement -> Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementState {
    /// Procedure is at rest with its geometry in the static position.
    #[default]
    Idle,
    /// Geometry is deploying towards its fully moved position.
    Movement,
    /// Geometry holds its deployed position until the back-wait elapses.
    BackWait,
    /// Geometry retracts towards its static position.
    ReverseMovement,
}

/// Monotonic simulation instant measured from the start of the simulation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimePoint(Duration);

impl TimePoint {
    /// Instant at which the simulation starts.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Creates a time point located `elapsed` after the simulation start.
    #[must_use]
    pub const fn from_duration(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Creates a time point located the provided number of seconds after the start.
    ///
    /// Negative or non-finite inputs collapse to [`TimePoint::ZERO`].
    #[must_use]
    pub fn from_secs_f32(seconds: f32) -> Self {
        Self(Duration::try_from_secs_f32(seconds).unwrap_or(Duration::ZERO))
    }

    /// Duration between the simulation start and this instant.
    #[must_use]
    pub const fn since_start(&self) -> Duration {
        self.0
    }

    /// Duration elapsed since `earlier`, or zero when `earlier` lies in the future.
    #[must_use]
    pub fn saturating_since(self, earlier: TimePoint) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns the instant `dt` after this one.
    #[must_use]
    pub fn saturating_add(self, dt: Duration) -> Self {
        Self(self.0.saturating_add(dt))
    }
}

/// Unique identifier of a procedure; equals its position in the map data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcedureId(u32);

impl ProcedureId {
    /// Creates a new procedure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a dynamic wall inside the dynamic wall store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallIndex(u32);

impl WallIndex {
    /// Creates a new wall index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single map cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Resolves the cell that contains a world-space position.
    ///
    /// Coordinates are truncated toward zero, so positions in `(-1, 0)` still
    /// land in the first row or column. Anything outside the grid, including
    /// non-finite values, yields `None`.
    #[must_use]
    pub fn from_position(position: Vec3) -> Option<Self> {
        let bounds = 0.0..MAP_SIZE as f32;
        let x = position.x.trunc();
        let y = position.y.trunc();
        if !bounds.contains(&x) || !bounds.contains(&y) {
            return None;
        }
        Some(Self::new(x as u32, y as u32))
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Reports whether the cell lies inside the map grid.
    #[must_use]
    pub const fn in_bounds(&self) -> bool {
        self.x < MAP_SIZE && self.y < MAP_SIZE
    }

    /// Row-major index of the cell inside per-cell tables, if it is in bounds.
    #[must_use]
    pub fn linear_index(&self) -> Option<usize> {
        if !self.in_bounds() {
            return None;
        }
        let x = usize::try_from(self.x).ok()?;
        let y = usize::try_from(self.y).ok()?;
        let width = usize::try_from(MAP_SIZE).ok()?;
        Some(x + y * width)
    }
}

/// Current geometry of a movable wall.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicWall {
    /// Both wall end points in world units.
    pub vertices: [Vec2; 2],
    /// Vertical offset of the wall in world units.
    pub z: f32,
}

impl DynamicWall {
    /// Creates a wall resting at the provided vertices with no vertical offset.
    #[must_use]
    pub const fn at_rest(vertices: [Vec2; 2]) -> Self {
        Self { vertices, z: 0.0 }
    }
}

/// Read-only view into the dynamic wall store.
#[derive(Clone, Copy, Debug)]
pub struct WallView<'a> {
    walls: &'a [DynamicWall],
}

impl<'a> WallView<'a> {
    /// Captures a new wall view backed by the provided slice.
    #[must_use]
    pub const fn new(walls: &'a [DynamicWall]) -> Self {
        Self { walls }
    }

    /// Returns the wall stored at the provided index, if any.
    #[must_use]
    pub fn get(&self, index: WallIndex) -> Option<&'a DynamicWall> {
        let index = usize::try_from(index.get()).ok()?;
        self.walls.get(index)
    }

    /// Iterates the walls in index order.
    pub fn iter(&self) -> impl Iterator<Item = (WallIndex, &'a DynamicWall)> + 'a {
        self.walls
            .iter()
            .enumerate()
            .map(|(index, wall)| (WallIndex::new(index as u32), wall))
    }

    /// Number of walls tracked by the store.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.walls.len()
    }

    /// Reports whether the store tracks no walls at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }
}

/// Immutable representation of a single procedure's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcedureSnapshot {
    /// Identifier of the procedure.
    pub id: ProcedureId,
    /// Current lifecycle state.
    pub state: MovementState,
    /// Progress inside the current state.
    pub stage: f32,
    /// Instant of the most recent transition.
    pub last_state_change: TimePoint,
    /// Progress value that currently drives the procedure's geometry.
    pub absolute_stage: f32,
}

/// Read-only snapshot describing every procedure of the map.
#[derive(Clone, Debug, Default)]
pub struct ProcedureView {
    snapshots: Vec<ProcedureSnapshot>,
}

impl ProcedureView {
    /// Creates a new procedure view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProcedureSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in procedure order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcedureSnapshot> {
        self.snapshots.iter()
    }

    /// Returns the snapshot of the provided procedure, if it exists.
    #[must_use]
    pub fn get(&self, id: ProcedureId) -> Option<&ProcedureSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProcedureSnapshot> {
        self.snapshots
    }
}

/// Discriminator carried by every replication message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageId {
    /// Full position update for one dynamic wall.
    WallPosition,
}

/// Fixed-size wire message describing one dynamic wall.
///
/// Coordinates are expressed in [`FIXED_POINT_SCALE`] units per world unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallPositionMessage {
    /// Always [`MessageId::WallPosition`].
    pub message_id: MessageId,
    /// Index of the wall inside the dynamic wall store.
    pub wall_index: u32,
    /// X/Y of both wall vertices.
    pub vertices_xy: [[i16; 2]; 2],
    /// Vertical offset of the wall.
    pub z: i16,
}

/// Capability to hand messages to the transport for best-effort delivery.
pub trait MessagesSender {
    /// Queues a message without any delivery guarantee.
    fn send_unreliable(&mut self, message: &WallPositionMessage);
}

impl MessagesSender for Vec<WallPositionMessage> {
    fn send_unreliable(&mut self, message: &WallPositionMessage) {
        self.push(*message);
    }
}
