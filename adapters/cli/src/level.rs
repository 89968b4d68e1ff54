//! Level files: rules, map, wave plan and a scripted build order.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use home_defence_core::{
    config::seconds, GameConfig, SpawnPointId, TileCoord, TowerKind, WaveDefinition, WavePlan,
};
use home_defence_simulation::PlayerCommand;
use home_defence_world::TileGrid;
use serde::Deserialize;

const MEADOW: &str = include_str!("../../../levels/meadow.toml");

/// Everything needed to start a headless game.
#[derive(Debug)]
pub(crate) struct Level {
    pub(crate) config: GameConfig,
    pub(crate) plan: WavePlan,
    pub(crate) grid: TileGrid,
    /// Player commands sorted by the time they are issued.
    pub(crate) orders: Vec<(Duration, PlayerCommand)>,
}

#[derive(Debug, Deserialize)]
struct LevelFile {
    #[serde(default)]
    config: GameConfig,
    map: MapSection,
    #[serde(default)]
    waves: Vec<WaveDefinition>,
    #[serde(default)]
    build_orders: Vec<BuildOrder>,
}

#[derive(Debug, Deserialize)]
struct MapSection {
    rows: Vec<String>,
    spawn_points: Vec<SpawnPointEntry>,
}

#[derive(Debug, Deserialize)]
struct SpawnPointEntry {
    id: u32,
    column: u32,
    row: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BuildAction {
    Place,
    Upgrade,
}

#[derive(Debug, Deserialize)]
struct BuildOrder {
    #[serde(with = "seconds")]
    at: Duration,
    action: BuildAction,
    column: u32,
    row: u32,
    #[serde(default)]
    tower: Option<TowerKind>,
}

impl BuildOrder {
    fn command(&self) -> Result<PlayerCommand> {
        let tile = TileCoord::new(self.column, self.row);
        match (&self.action, self.tower) {
            (BuildAction::Place, Some(kind)) => Ok(PlayerCommand::Place { tile, kind }),
            (BuildAction::Place, None) => bail!(
                "build order at {:.1}s places a tower without naming its kind",
                self.at.as_secs_f32()
            ),
            (BuildAction::Upgrade, _) => Ok(PlayerCommand::Upgrade { tile }),
        }
    }
}

impl Level {
    /// Level bundled with the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(MEADOW).context("failed to parse the built-in meadow level")
    }

    /// Reads and parses the level file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse level file at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let file: LevelFile = toml::from_str(contents).context("invalid level toml")?;

        let mut grid = TileGrid::from_rows(&file.map.rows).context("invalid map rows")?;
        for entry in &file.map.spawn_points {
            grid = grid.with_spawn_point(
                SpawnPointId::new(entry.id),
                TileCoord::new(entry.column, entry.row),
            );
        }

        let mut orders = file
            .build_orders
            .iter()
            .map(|order| Ok((order.at, order.command()?)))
            .collect::<Result<Vec<_>>>()?;
        // Stable: orders issued at the same instant keep file order.
        orders.sort_by_key(|(at, _)| *at);

        Ok(Self {
            config: file.config,
            plan: WavePlan::new(file.waves),
            grid,
            orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use home_defence_simulation::Simulation;

    use super::*;

    const LANE: &str = r#"
        [map]
        rows = [".....", ">>>>H", "....."]
        spawn_points = [{ id = 0, column = 0, row = 1 }]

        [[waves]]
        lead_time = 1.5
        reward = 10
        spawns = [{ kind = "goblin" }, { kind = "slime", delay = 2 }]

        [[build_orders]]
        at = 4.0
        action = "upgrade"
        column = 1
        row = 0

        [[build_orders]]
        at = 0.5
        action = "place"
        tower = "archer"
        column = 1
        row = 0
    "#;

    #[test]
    fn builtin_level_starts_a_simulation() {
        let level = Level::builtin().expect("meadow parses");
        assert_eq!(level.plan.waves.len(), 3);
        assert_eq!(level.grid.spawn_points().count(), 2);
        assert!(level.orders.windows(2).all(|pair| pair[0].0 <= pair[1].0));

        let simulation = Simulation::new(level.config, level.plan, level.grid);
        assert!(simulation.is_ok());
    }

    #[test]
    fn level_fields_map_onto_the_rules() {
        let level = Level::parse(LANE).expect("lane parses");

        assert_eq!(level.config, GameConfig::default());
        let wave = &level.plan.waves[0];
        assert_eq!(wave.lead_time, Duration::from_millis(1_500));
        assert_eq!(wave.spawns[1].delay, Duration::from_secs(2));
        assert_eq!(wave.spawns[1].spawn_point, SpawnPointId::new(0));
        assert_eq!(
            level.orders,
            vec![
                (
                    Duration::from_millis(500),
                    PlayerCommand::Place {
                        tile: TileCoord::new(1, 0),
                        kind: TowerKind::Archer,
                    },
                ),
                (
                    Duration::from_secs(4),
                    PlayerCommand::Upgrade {
                        tile: TileCoord::new(1, 0),
                    },
                ),
            ]
        );
    }

    #[test]
    fn place_orders_need_a_tower_kind() {
        let broken = LANE.replace("tower = \"archer\"", "");
        let error = Level::parse(&broken).expect_err("kind missing");
        assert!(error.to_string().contains("without naming its kind"));
    }

    #[test]
    fn unknown_map_symbols_are_reported() {
        let broken = LANE.replace(">>>>H", ">>?>H");
        let error = Level::parse(&broken).expect_err("bad symbol");
        assert!(format!("{error:#}").contains("invalid map rows"));
    }

    #[test]
    fn missing_files_name_the_path() {
        let error = Level::load(Path::new("does/not/exist.toml")).expect_err("missing file");
        assert!(error.to_string().contains("does/not/exist.toml"));
    }
}
