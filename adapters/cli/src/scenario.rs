//! JSON scenario files consumed by the headless simulation.
//!
//! A scenario bundles the static map tables with a scripted list of actor
//! positions. Per-cell tables are stored sparsely and expanded into
//! [`MapData`] on load.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use glam::{Vec2, Vec3};
use map_procedures_core::{
    ActionCommand, ActionCommandId, CellCoord, IndexElement, Link, MapData, Procedure,
    ProcedureId, TimePoint, WallGeometry, WallIndex, ACTION_COMMAND_ARGS,
};
use serde::{Deserialize, Serialize};

/// Scenario description as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Scenario {
    /// Procedures in identifier order.
    pub(crate) procedures: Vec<ScenarioProcedure>,
    /// Static geometry of every dynamic wall in index order.
    pub(crate) walls: Vec<[[f32; 2]; 2]>,
    /// Cells carrying trigger bindings.
    #[serde(default)]
    pub(crate) links: Vec<ScenarioLink>,
    /// Cells resolving to a dynamic wall.
    #[serde(default)]
    pub(crate) wall_cells: Vec<ScenarioWallCell>,
    /// Actor positions replayed during the run, ordered by time.
    #[serde(default)]
    pub(crate) actor_positions: Vec<ScriptedPosition>,
}

/// Procedure definition inside a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScenarioProcedure {
    /// Progress units gained per ten seconds of movement.
    pub(crate) speed: f32,
    /// Seconds the procedure holds its deployed position.
    pub(crate) back_wait_s: f32,
    /// Script commands in execution order.
    #[serde(default)]
    pub(crate) commands: Vec<ScenarioCommand>,
}

/// Raw action command inside a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScenarioCommand {
    /// Command kind.
    pub(crate) kind: ActionCommandId,
    /// Leading arguments; missing trailing arguments are zero.
    #[serde(default)]
    pub(crate) args: Vec<f32>,
}

/// Trigger kinds a scenario may bind to a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TriggerKind {
    Floor,
    Switch,
    Shoot,
}

/// Trigger binding inside a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScenarioLink {
    /// Cell carrying the trigger.
    pub(crate) cell: [u32; 2],
    /// How the trigger is activated.
    pub(crate) trigger: TriggerKind,
    /// Procedure started by the trigger.
    pub(crate) procedure: u32,
}

/// Cell occupied by a dynamic wall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScenarioWallCell {
    /// Occupied cell.
    pub(crate) cell: [u32; 2],
    /// Dynamic wall index.
    pub(crate) wall: u32,
}

/// Actor position reported at a point in simulated time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScriptedPosition {
    /// Seconds since the start of the run.
    pub(crate) at_s: f32,
    /// World-space position.
    pub(crate) position: [f32; 3],
}

impl ScriptedPosition {
    /// Time at which the position is reported.
    pub(crate) fn time(&self) -> TimePoint {
        TimePoint::from_secs_f32(self.at_s)
    }

    /// Reported position as a vector.
    pub(crate) fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses a scenario from its JSON text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(text).context("malformed scenario json")?;
        scenario.check()?;
        Ok(scenario)
    }

    fn check(&self) -> Result<()> {
        for link in &self.links {
            ensure!(
                in_grid(link.cell),
                "link cell {:?} lies outside the map",
                link.cell
            );
        }
        for wall_cell in &self.wall_cells {
            ensure!(
                in_grid(wall_cell.cell),
                "wall cell {:?} lies outside the map",
                wall_cell.cell
            );
        }
        for (position, procedure) in self.procedures.iter().enumerate() {
            for command in &procedure.commands {
                ensure!(
                    command.args.len() <= ACTION_COMMAND_ARGS,
                    "procedure {position} has a {:?} command with {} arguments",
                    command.kind,
                    command.args.len()
                );
            }
        }
        for scripted in &self.actor_positions {
            ensure!(
                scripted.at_s.is_finite() && scripted.at_s >= 0.0,
                "actor position time {} is not a non-negative number",
                scripted.at_s
            );
        }
        ensure!(
            self.actor_positions
                .windows(2)
                .all(|pair| pair[0].at_s <= pair[1].at_s),
            "actor positions must be ordered by time"
        );
        Ok(())
    }

    /// Expands the sparse tables into engine map data.
    pub(crate) fn map_data(&self) -> MapData {
        let procedures = self
            .procedures
            .iter()
            .map(|procedure| Procedure {
                speed: procedure.speed,
                back_wait_s: procedure.back_wait_s,
                action_commands: procedure
                    .commands
                    .iter()
                    .map(|command| ActionCommand::new(command.kind, &command.args))
                    .collect(),
            })
            .collect();
        let walls = self
            .walls
            .iter()
            .map(|[first, second]| WallGeometry {
                vertices: [Vec2::from_array(*first), Vec2::from_array(*second)],
            })
            .collect();

        let map = self
            .links
            .iter()
            .fold(MapData::new(procedures, walls), |map, link| {
                let procedure = ProcedureId::new(link.procedure);
                let binding = match link.trigger {
                    TriggerKind::Floor => Link::Floor(procedure),
                    TriggerKind::Switch => Link::Switch(procedure),
                    TriggerKind::Shoot => Link::Shoot(procedure),
                };
                map.with_link(cell(link.cell), binding)
            });
        self.wall_cells.iter().fold(map, |map, wall_cell| {
            map.with_index(
                cell(wall_cell.cell),
                IndexElement::DynamicWall(WallIndex::new(wall_cell.wall)),
            )
        })
    }
}

fn cell([x, y]: [u32; 2]) -> CellCoord {
    CellCoord::new(x, y)
}

fn in_grid(coords: [u32; 2]) -> bool {
    cell(coords).in_bounds()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOOR_SCENARIO: &str = r#"{
        "procedures": [
            {
                "speed": 10.0,
                "back_wait_s": 1.0,
                "commands": [
                    { "kind": "Lock" },
                    { "kind": "Move", "args": [10, 20, 2560, 0, 3] }
                ]
            }
        ],
        "walls": [[[10.0, 20.0], [10.0, 25.0]]],
        "links": [
            { "cell": [2, 2], "trigger": "floor", "procedure": 0 },
            { "cell": [3, 2], "trigger": "switch", "procedure": 0 }
        ],
        "wall_cells": [{ "cell": [10, 20], "wall": 0 }],
        "actor_positions": [
            { "at_s": 0.0, "position": [2.5, 2.5, 0.0] },
            { "at_s": 4.0, "position": [2.5, 2.5, 0.0] }
        ]
    }"#;

    #[test]
    fn parses_door_scenario() {
        let scenario = Scenario::parse(DOOR_SCENARIO).expect("scenario parses");
        assert_eq!(scenario.procedures.len(), 1);
        assert_eq!(scenario.procedures[0].commands[1].kind, ActionCommandId::Move);
        assert_eq!(scenario.actor_positions[1].time(), TimePoint::from_secs_f32(4.0));
        assert_eq!(
            scenario.actor_positions[0].position(),
            Vec3::new(2.5, 2.5, 0.0)
        );
    }

    #[test]
    fn expands_sparse_tables_into_map_data() {
        let map = Scenario::parse(DOOR_SCENARIO)
            .expect("scenario parses")
            .map_data();

        assert_eq!(
            map.link(CellCoord::new(2, 2)),
            Link::Floor(ProcedureId::new(0))
        );
        assert_eq!(
            map.link(CellCoord::new(3, 2)),
            Link::Switch(ProcedureId::new(0))
        );
        assert_eq!(map.link(CellCoord::new(4, 2)), Link::None);
        assert_eq!(
            map.index_element(CellCoord::new(10, 20)),
            IndexElement::DynamicWall(WallIndex::new(0))
        );
        assert_eq!(
            map.procedures()[0].action_commands[1].args,
            [10.0, 20.0, 2560.0, 0.0, 3.0, 0.0]
        );
        assert_eq!(
            map.dynamic_walls()[0].vertices,
            [Vec2::new(10.0, 20.0), Vec2::new(10.0, 25.0)]
        );
    }

    #[test]
    fn optional_tables_default_to_empty() {
        let scenario = Scenario::parse(r#"{ "procedures": [], "walls": [] }"#)
            .expect("scenario parses");
        assert!(scenario.links.is_empty());
        assert!(scenario.wall_cells.is_empty());
        assert!(scenario.actor_positions.is_empty());
    }

    #[test]
    fn rejects_cells_outside_the_map() {
        let text = r#"{
            "procedures": [],
            "walls": [],
            "links": [{ "cell": [64, 0], "trigger": "floor", "procedure": 0 }]
        }"#;
        assert!(Scenario::parse(text).is_err());
    }

    #[test]
    fn rejects_unordered_actor_positions() {
        let text = r#"{
            "procedures": [],
            "walls": [],
            "actor_positions": [
                { "at_s": 2.0, "position": [0, 0, 0] },
                { "at_s": 1.0, "position": [0, 0, 0] }
            ]
        }"#;
        assert!(Scenario::parse(text).is_err());
    }

    #[test]
    fn rejects_unknown_command_kinds() {
        let text = r#"{
            "procedures": [{ "speed": 1.0, "back_wait_s": 0.0, "commands": [{ "kind": "Fly" }] }],
            "walls": []
        }"#;
        assert!(Scenario::parse(text).is_err());
    }
}
