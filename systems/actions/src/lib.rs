#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Interpreter for procedure scripts that reposition dynamic walls.
//!
//! Scripts are compiled once from the static [`ActionCommand`] tables into
//! [`Action`] values. Every tick the world evaluates each script against the
//! owning procedure's absolute action stage. Targets are always derived from
//! the static wall geometry, never from the previous tick's result, so
//! evaluation carries no drift between ticks.

use glam::Vec2;
use map_procedures_core::{
    ActionCommand, ActionCommandId, CellCoord, DynamicWall, IndexElement, MapData, Procedure,
    WallGeometry, WallIndex,
};

/// Scale of coordinates stored in command arguments (1/256 world unit).
pub const COMMAND_COORDS_SCALE: f32 = 1.0 / 256.0;

/// Decoded action command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Translates the wall by `offset * stage`.
    Move {
        /// Cell that resolves to the moved wall.
        cell: CellCoord,
        /// Full translation in world units.
        offset: Vec2,
        /// Sound played by the map when the command fires.
        sound: f32,
    },
    /// Rotates the wall around `pivot` by `angle_degrees * stage`.
    Rotate {
        /// Cell that resolves to the rotated wall.
        cell: CellCoord,
        /// Rotation pivot in world units.
        pivot: Vec2,
        /// Full rotation angle in degrees, counter-clockwise.
        angle_degrees: f32,
        /// Sound played by the map when the command fires.
        sound: f32,
    },
    /// Raises the wall by `height * stage`.
    Up {
        /// Cell that resolves to the raised wall.
        cell: CellCoord,
        /// Full vertical offset in world units.
        height: f32,
        /// Sound played by the map when the command fires.
        sound: f32,
    },
    /// Command kind without geometric effect. Always a no-op.
    Unhandled(ActionCommandId),
}

impl Action {
    /// Decodes a raw command.
    #[must_use]
    pub fn decode(command: &ActionCommand) -> Self {
        let args = &command.args;
        match command.id {
            ActionCommandId::Move => Self::Move {
                cell: command_cell(args[0], args[1]),
                offset: Vec2::new(args[2], args[3]) * COMMAND_COORDS_SCALE,
                sound: args[4],
            },
            ActionCommandId::Rotate => Self::Rotate {
                cell: command_cell(args[0], args[1]),
                pivot: Vec2::new(args[2], args[3]) * COMMAND_COORDS_SCALE,
                angle_degrees: args[4],
                sound: args[5],
            },
            ActionCommandId::Up => Self::Up {
                cell: command_cell(args[0], args[1]),
                height: args[2] * COMMAND_COORDS_SCALE,
                sound: args[3],
            },
            other => Self::Unhandled(other),
        }
    }

    /// Cell targeted by the action, if it has geometric effect.
    #[must_use]
    pub const fn cell(&self) -> Option<CellCoord> {
        match self {
            Self::Move { cell, .. } | Self::Rotate { cell, .. } | Self::Up { cell, .. } => {
                Some(*cell)
            }
            Self::Unhandled(_) => None,
        }
    }

    /// Computes the wall geometry produced at `stage` from the static `base`.
    ///
    /// Returns `None` for unhandled kinds. Both vertices and the height are
    /// always produced, even at stage zero.
    #[must_use]
    pub fn target(&self, base: &WallGeometry, stage: f32) -> Option<DynamicWall> {
        match *self {
            Self::Move { offset, .. } => {
                let shift = offset * stage;
                Some(DynamicWall {
                    vertices: base.vertices.map(|vertex| vertex + shift),
                    z: 0.0,
                })
            }
            Self::Rotate {
                pivot,
                angle_degrees,
                ..
            } => {
                let rotation = Vec2::from_angle(angle_degrees.to_radians() * stage);
                Some(DynamicWall {
                    vertices: base
                        .vertices
                        .map(|vertex| pivot + rotation.rotate(vertex - pivot)),
                    z: 0.0,
                })
            }
            Self::Up { height, .. } => Some(DynamicWall {
                vertices: base.vertices,
                z: height * stage,
            }),
            Self::Unhandled(_) => None,
        }
    }
}

/// Compiled script of a single procedure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    actions: Vec<Action>,
}

impl Script {
    /// Decodes every command of a procedure, preserving definition order.
    #[must_use]
    pub fn compile(procedure: &Procedure) -> Self {
        Self {
            actions: procedure.action_commands.iter().map(Action::decode).collect(),
        }
    }

    /// Decoded actions in definition order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Writes the geometry of every wall driven by the script at `stage`.
    ///
    /// Later actions targeting the same wall overwrite earlier ones. Actions
    /// whose cell does not hold a dynamic wall are skipped. `walls` must have
    /// one entry per static dynamic wall of `map`.
    pub fn apply(&self, stage: f32, map: &MapData, walls: &mut [DynamicWall]) {
        for action in &self.actions {
            let Some(cell) = action.cell() else {
                continue;
            };
            let Some(wall) = resolve_wall(map, cell) else {
                continue;
            };
            let index = wall.get() as usize;
            let base = &map.dynamic_walls()[index];
            if let Some(target) = action.target(base, stage) {
                walls[index] = target;
            }
        }
    }
}

/// Resolves the dynamic wall occupying a cell.
#[must_use]
pub fn resolve_wall(map: &MapData, cell: CellCoord) -> Option<WallIndex> {
    match map.index_element(cell) {
        IndexElement::DynamicWall(index) => Some(index),
        _ => None,
    }
}

fn command_cell(x: f32, y: f32) -> CellCoord {
    CellCoord::new(u32::from(x as u8), u32::from(y as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_procedures_core::{Link, ProcedureId};

    const EPSILON: f32 = 1e-4;

    fn assert_vec_close(actual: Vec2, expected: Vec2) {
        assert!(
            (actual - expected).length() < EPSILON,
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn wall_at(cell: CellCoord, vertices: [Vec2; 2], commands: Vec<ActionCommand>) -> MapData {
        MapData::new(
            vec![Procedure {
                speed: 10.0,
                back_wait_s: 1.0,
                action_commands: commands,
            }],
            vec![WallGeometry { vertices }],
        )
        .with_index(cell, IndexElement::DynamicWall(WallIndex::new(0)))
        .with_link(CellCoord::new(0, 0), Link::Floor(ProcedureId::new(0)))
    }

    #[test]
    fn move_decodes_fixed_point_offsets() {
        let command = ActionCommand::new(ActionCommandId::Move, &[3.0, 4.0, 2560.0, -512.0, 7.0]);
        assert_eq!(
            Action::decode(&command),
            Action::Move {
                cell: CellCoord::new(3, 4),
                offset: Vec2::new(10.0, -2.0),
                sound: 7.0,
            }
        );
    }

    #[test]
    fn unknown_kinds_decode_to_unhandled() {
        let command = ActionCommand::new(ActionCommandId::Quake, &[1.0, 1.0]);
        let action = Action::decode(&command);
        assert_eq!(action, Action::Unhandled(ActionCommandId::Quake));
        assert_eq!(action.cell(), None);
        let base = WallGeometry {
            vertices: [Vec2::ZERO, Vec2::X],
        };
        assert_eq!(action.target(&base, 1.0), None);
    }

    #[test]
    fn move_interpolates_with_stage() {
        let base = WallGeometry {
            vertices: [Vec2::new(10.0, 20.0), Vec2::new(10.0, 25.0)],
        };
        let action = Action::Move {
            cell: CellCoord::new(0, 0),
            offset: Vec2::new(10.0, 0.0),
            sound: 0.0,
        };
        let wall = action.target(&base, 0.5).expect("move has geometry");
        assert_vec_close(wall.vertices[0], Vec2::new(15.0, 20.0));
        assert_vec_close(wall.vertices[1], Vec2::new(15.0, 25.0));
        assert_eq!(wall.z, 0.0);
    }

    #[test]
    fn full_rotation_matches_direct_rotation() {
        let base = WallGeometry {
            vertices: [Vec2::new(3.0, 2.0), Vec2::new(5.0, 2.0)],
        };
        let pivot = Vec2::new(2.0, 2.0);
        let action = Action::Rotate {
            cell: CellCoord::new(0, 0),
            pivot,
            angle_degrees: 90.0,
            sound: 0.0,
        };
        let wall = action.target(&base, 1.0).expect("rotate has geometry");
        assert_vec_close(wall.vertices[0], Vec2::new(2.0, 3.0));
        assert_vec_close(wall.vertices[1], Vec2::new(2.0, 5.0));

        let halfway = action.target(&base, 0.5).expect("rotate has geometry");
        let quarter = std::f32::consts::FRAC_PI_4;
        assert_vec_close(
            halfway.vertices[0],
            pivot + Vec2::new(quarter.cos(), quarter.sin()),
        );
    }

    #[test]
    fn up_keeps_vertices_and_raises_height() {
        let base = WallGeometry {
            vertices: [Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0)],
        };
        let action = Action::decode(&ActionCommand::new(ActionCommandId::Up, &[0.0, 0.0, 512.0]));
        let wall = action.target(&base, 0.25).expect("up has geometry");
        assert_eq!(wall.vertices, base.vertices);
        assert!((wall.z - 0.5).abs() < EPSILON);
    }

    #[test]
    fn stage_zero_restores_static_geometry() {
        let base = WallGeometry {
            vertices: [Vec2::new(4.0, 4.0), Vec2::new(6.0, 4.0)],
        };
        let actions = [
            Action::decode(&ActionCommand::new(ActionCommandId::Move, &[0.0, 0.0, 256.0, 256.0])),
            Action::decode(&ActionCommand::new(
                ActionCommandId::Rotate,
                &[0.0, 0.0, 1024.0, 1024.0, 45.0],
            )),
            Action::decode(&ActionCommand::new(ActionCommandId::Up, &[0.0, 0.0, 256.0])),
        ];
        for action in actions {
            let wall = action.target(&base, 0.0).expect("geometry");
            assert_vec_close(wall.vertices[0], base.vertices[0]);
            assert_vec_close(wall.vertices[1], base.vertices[1]);
            assert_eq!(wall.z, 0.0);
        }
    }

    #[test]
    fn later_commands_win_for_the_same_wall() {
        let cell = CellCoord::new(5, 5);
        let map = wall_at(
            cell,
            [Vec2::new(5.0, 5.0), Vec2::new(6.0, 5.0)],
            vec![
                ActionCommand::new(ActionCommandId::Up, &[5.0, 5.0, 2560.0]),
                ActionCommand::new(ActionCommandId::Move, &[5.0, 5.0, 256.0, 0.0]),
            ],
        );
        let script = Script::compile(&map.procedures()[0]);
        let mut walls = vec![DynamicWall::default()];

        script.apply(1.0, &map, &mut walls);

        assert_vec_close(walls[0].vertices[0], Vec2::new(6.0, 5.0));
        assert_eq!(walls[0].z, 0.0);
    }

    #[test]
    fn commands_on_static_cells_are_no_ops() {
        let wall_cell = CellCoord::new(5, 5);
        let map = wall_at(
            wall_cell,
            [Vec2::new(5.0, 5.0), Vec2::new(6.0, 5.0)],
            vec![ActionCommand::new(ActionCommandId::Move, &[9.0, 9.0, 256.0, 0.0])],
        )
        .with_index(CellCoord::new(9, 9), IndexElement::StaticWall(3));
        let script = Script::compile(&map.procedures()[0]);
        let untouched = DynamicWall::at_rest([Vec2::splat(-1.0), Vec2::splat(-2.0)]);
        let mut walls = vec![untouched];

        script.apply(1.0, &map, &mut walls);

        assert_eq!(walls[0], untouched);
    }

    #[test]
    fn command_cells_truncate_through_a_byte() {
        assert_eq!(command_cell(12.9, 300.0), CellCoord::new(12, 255));
        assert_eq!(command_cell(-4.0, 1.0), CellCoord::new(0, 1));
    }
}
