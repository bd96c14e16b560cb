//! Load-time checks that let the tick path index static tables directly.

use map_procedures_core::{CellCoord, IndexElement, Link, MapData, ProcedureId, WallIndex};
use map_procedures_system_actions::Action;
use thiserror::Error;

/// Reasons static map data is rejected when constructing a world.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MapError {
    /// A trigger link names a procedure the map does not define.
    #[error("cell {cell:?} links procedure {} but the map defines {count}", .procedure.get())]
    LinkProcedureOutOfRange {
        /// Cell carrying the link.
        cell: CellCoord,
        /// Procedure named by the link.
        procedure: ProcedureId,
        /// Number of procedures defined by the map.
        count: usize,
    },
    /// The cell index names a dynamic wall the map does not define.
    #[error("cell {cell:?} indexes dynamic wall {} but the map defines {count}", .wall.get())]
    IndexWallOutOfRange {
        /// Cell carrying the index entry.
        cell: CellCoord,
        /// Wall named by the index entry.
        wall: WallIndex,
        /// Number of dynamic walls defined by the map.
        count: usize,
    },
    /// A geometric command addresses a cell outside the map grid.
    #[error("command {command} of procedure {} addresses cell {cell:?} outside the map", .procedure.get())]
    CommandCellOutOfRange {
        /// Procedure owning the command.
        procedure: ProcedureId,
        /// Position of the command inside the procedure script.
        command: usize,
        /// Cell decoded from the command arguments.
        cell: CellCoord,
    },
    /// A procedure's speed or back-wait is negative or not finite.
    #[error(
        "procedure {} has invalid timing (speed {speed}, back wait {back_wait_s}s)",
        .procedure.get()
    )]
    InvalidProcedureTiming {
        /// Offending procedure.
        procedure: ProcedureId,
        /// Configured speed.
        speed: f32,
        /// Configured back-wait in seconds.
        back_wait_s: f32,
    },
}

/// Validates every cross reference of the static map data.
pub(crate) fn validate(map: &MapData) -> Result<(), MapError> {
    let procedure_count = map.procedures().len();
    for (cell, link) in map.links() {
        let procedure = match link {
            Link::None => continue,
            Link::Floor(procedure) | Link::Switch(procedure) | Link::Shoot(procedure) => procedure,
        };
        if procedure.get() as usize >= procedure_count {
            return Err(MapError::LinkProcedureOutOfRange {
                cell,
                procedure,
                count: procedure_count,
            });
        }
    }

    let wall_count = map.dynamic_walls().len();
    for (cell, element) in map.index_elements() {
        if let IndexElement::DynamicWall(wall) = element {
            if wall.get() as usize >= wall_count {
                return Err(MapError::IndexWallOutOfRange {
                    cell,
                    wall,
                    count: wall_count,
                });
            }
        }
    }

    for (position, definition) in map.procedures().iter().enumerate() {
        let procedure = ProcedureId::new(position as u32);
        if !is_valid_timing(definition.speed) || !is_valid_timing(definition.back_wait_s) {
            return Err(MapError::InvalidProcedureTiming {
                procedure,
                speed: definition.speed,
                back_wait_s: definition.back_wait_s,
            });
        }

        for (command, raw) in definition.action_commands.iter().enumerate() {
            if let Some(cell) = Action::decode(raw).cell() {
                if !cell.in_bounds() {
                    return Err(MapError::CommandCellOutOfRange {
                        procedure,
                        command,
                        cell,
                    });
                }
            }
        }
    }

    Ok(())
}

fn is_valid_timing(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
