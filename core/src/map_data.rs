//! Immutable static map data consumed by the engine.
//!
//! The loader that produces these tables lives outside this workspace; the
//! engine only borrows them. Per-cell tables are dense and row-major with
//! [`MAP_SIZE`] cells per edge.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{CellCoord, ProcedureId, WallIndex, MAP_SIZE};

/// Number of numeric arguments stored with every action command.
pub const ACTION_COMMAND_ARGS: usize = 6;

const CELL_COUNT: usize = (MAP_SIZE * MAP_SIZE) as usize;

/// Trigger binding attached to a map cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Link {
    /// Cell carries no trigger.
    #[default]
    None,
    /// Stepping onto the cell starts the named procedure.
    Floor(ProcedureId),
    /// Using a switch in the cell starts the named procedure.
    Switch(ProcedureId),
    /// Shooting the cell starts the named procedure.
    Shoot(ProcedureId),
}

/// Kind of object that occupies a map cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexElement {
    /// Cell is empty.
    #[default]
    None,
    /// Cell holds an immovable wall with the provided static index.
    StaticWall(u32),
    /// Cell holds a wall that procedures may move.
    DynamicWall(WallIndex),
    /// Cell holds a map model with the provided index.
    Model(u32),
}

/// Command vocabulary of procedure scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ActionCommandId {
    Lock,
    Unlock,
    PlayAnimation,
    StopAnimation,
    Move,
    XMove,
    YMove,
    Rotate,
    Up,
    Light,
    Change,
    Death,
    Explode,
    Quake,
    Ambient,
    Wind,
    Source,
    Waitout,
    Nonstop,
}

/// One step of a procedure script.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionCommand {
    /// Kind of the command.
    pub id: ActionCommandId,
    /// Raw numeric arguments; their meaning depends on [`ActionCommand::id`].
    pub args: [f32; ACTION_COMMAND_ARGS],
}

impl ActionCommand {
    /// Creates a command from a kind and a prefix of its arguments.
    ///
    /// Missing trailing arguments are zero; extra arguments are dropped.
    #[must_use]
    pub fn new(id: ActionCommandId, args: &[f32]) -> Self {
        let mut padded = [0.0; ACTION_COMMAND_ARGS];
        for (slot, value) in padded.iter_mut().zip(args) {
            *slot = *value;
        }
        Self { id, args: padded }
    }
}

/// Scripted sequence bound to triggers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    /// Progress units gained per ten seconds of movement.
    pub speed: f32,
    /// Seconds to hold the deployed position; zero keeps it deployed forever.
    pub back_wait_s: f32,
    /// Ordered script evaluated every tick.
    pub action_commands: Vec<ActionCommand>,
}

/// Static geometry of a movable wall.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallGeometry {
    /// Both wall end points in world units.
    pub vertices: [Vec2; 2],
}

/// Complete static description of a map as far as procedures are concerned.
#[derive(Clone, Debug)]
pub struct MapData {
    links: Vec<Link>,
    index: Vec<IndexElement>,
    procedures: Vec<Procedure>,
    dynamic_walls: Vec<WallGeometry>,
}

impl MapData {
    /// Creates map data with empty link and index tables.
    #[must_use]
    pub fn new(procedures: Vec<Procedure>, dynamic_walls: Vec<WallGeometry>) -> Self {
        Self {
            links: vec![Link::None; CELL_COUNT],
            index: vec![IndexElement::None; CELL_COUNT],
            procedures,
            dynamic_walls,
        }
    }

    /// Binds a trigger link to the provided cell. Out-of-grid cells are ignored.
    #[must_use]
    pub fn with_link(mut self, cell: CellCoord, link: Link) -> Self {
        if let Some(slot) = cell.linear_index().and_then(|index| self.links.get_mut(index)) {
            *slot = link;
        }
        self
    }

    /// Records the object occupying the provided cell. Out-of-grid cells are ignored.
    #[must_use]
    pub fn with_index(mut self, cell: CellCoord, element: IndexElement) -> Self {
        if let Some(slot) = cell.linear_index().and_then(|index| self.index.get_mut(index)) {
            *slot = element;
        }
        self
    }

    /// Trigger link of the provided cell; out-of-grid cells carry none.
    #[must_use]
    pub fn link(&self, cell: CellCoord) -> Link {
        cell.linear_index()
            .and_then(|index| self.links.get(index).copied())
            .unwrap_or_default()
    }

    /// Object occupying the provided cell; out-of-grid cells are empty.
    #[must_use]
    pub fn index_element(&self, cell: CellCoord) -> IndexElement {
        cell.linear_index()
            .and_then(|index| self.index.get(index).copied())
            .unwrap_or_default()
    }

    /// Iterates every cell together with its trigger link.
    pub fn links(&self) -> impl Iterator<Item = (CellCoord, Link)> + '_ {
        self.links
            .iter()
            .enumerate()
            .map(|(index, link)| (cell_from_linear(index), *link))
    }

    /// Iterates every cell together with the object occupying it.
    pub fn index_elements(&self) -> impl Iterator<Item = (CellCoord, IndexElement)> + '_ {
        self.index
            .iter()
            .enumerate()
            .map(|(index, element)| (cell_from_linear(index), *element))
    }

    /// Procedure definitions in identifier order.
    #[must_use]
    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    /// Static geometry of every movable wall in index order.
    #[must_use]
    pub fn dynamic_walls(&self) -> &[WallGeometry] {
        &self.dynamic_walls
    }
}

fn cell_from_linear(index: usize) -> CellCoord {
    let width = MAP_SIZE as usize;
    CellCoord::new((index % width) as u32, (index / width) as u32)
}
