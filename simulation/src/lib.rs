#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame orchestrator tying the world and its systems together.
//!
//! Every [`Simulation::advance`] runs the subsystems in a fixed order: the
//! wave scheduler, enemy movement and tower cooldowns, tower targeting, tower
//! combat and finally projectile flight. Each stage reads fresh views of the
//! world and submits commands that are applied before the next stage runs.
//! Once the game is over the subsystems freeze and only the presenter's
//! ending keeps running.

mod presenter;
mod snapshot;

use std::time::Duration;

use home_defence_core::{
    Command, CommandError, ConfigError, Event, GameConfig, TileCoord, TowerId, TowerKind, WavePlan,
};
use home_defence_system_tower_combat::TowerCombat;
use home_defence_system_tower_targeting::TowerTargeting;
use home_defence_system_wave_scheduler::WaveScheduler;
use home_defence_world::{self as world, query, TileGrid, World};
use tracing::{debug, info};

pub use presenter::{Notification, Presenter};
pub use snapshot::{Snapshot, WaveProgress};

/// Player commands accepted by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Builds a tower of `kind` on `tile`.
    Place {
        /// Tile that should host the tower.
        tile: TileCoord,
        /// Type of tower to construct.
        kind: TowerKind,
    },
    /// Raises the level of the tower standing on `tile`.
    Upgrade {
        /// Tile hosting the tower.
        tile: TileCoord,
    },
}

/// Lifecycle reported after each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// The game is being played.
    Running,
    /// The game is over and the presenter's ending is still running.
    Ending,
    /// The ending finished; further frames do nothing.
    Finished,
}

/// Owns the world and every system, and advances them frame by frame.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    scheduler: WaveScheduler,
    targeting: TowerTargeting,
    combat: TowerCombat,
    commands: Vec<Command>,
    events: Vec<Event>,
    progress: Progress,
    elapsed: Duration,
}

impl Simulation {
    /// Validates the rules, the wave plan and the map, and derives every route.
    pub fn new(config: GameConfig, plan: WavePlan, grid: TileGrid) -> Result<Self, ConfigError> {
        plan.validate(&config, |spawn_point| grid.has_spawn_point(spawn_point))?;
        let world = World::new(config, grid)?;
        info!(
            waves = plan.waves.len(),
            spawn_points = query::routes(&world).count(),
            "simulation ready"
        );

        Ok(Self {
            world,
            scheduler: WaveScheduler::new(plan),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            commands: Vec::new(),
            events: Vec::new(),
            progress: Progress::Running,
            elapsed: Duration::ZERO,
        })
    }

    /// Advances the game by `dt`, forwarding every cue to `presenter`.
    pub fn advance<P>(&mut self, dt: Duration, presenter: &mut P) -> Progress
    where
        P: Presenter + ?Sized,
    {
        match self.progress {
            Progress::Finished => return Progress::Finished,
            Progress::Ending => {
                if presenter.advance_ending(dt) {
                    debug!("ending finished");
                    self.progress = Progress::Finished;
                }
                return self.progress;
            }
            Progress::Running => {}
        }

        self.elapsed = self.elapsed.saturating_add(dt);

        self.scheduler.advance(dt, &mut self.commands);
        self.commands.push(Command::Tick { dt });
        if self.flush(presenter) {
            return self.progress;
        }

        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        if self.flush(presenter) {
            return self.progress;
        }

        self.combat.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        if self.flush(presenter) {
            return self.progress;
        }

        self.commands.push(Command::AdvanceProjectiles { dt });
        let _ = self.flush(presenter);
        self.progress
    }

    /// Applies a player command, returning the affected tower on success.
    pub fn handle_command(&mut self, command: PlayerCommand) -> Result<TowerId, CommandError> {
        let command = match command {
            PlayerCommand::Place { tile, kind } => Command::PlaceTower { kind, tile },
            PlayerCommand::Upgrade { tile } => Command::UpgradeTower { tile },
        };

        self.events.clear();
        world::apply(&mut self.world, command, &mut self.events);
        let result = self.events.iter().find_map(|event| match *event {
            Event::TowerPlaced { tower, .. } | Event::TowerUpgraded { tower, .. } => {
                Some(Ok(tower))
            }
            Event::TowerPlacementRejected { reason, .. }
            | Event::TowerUpgradeRejected { reason, .. } => Some(Err(reason)),
            _ => None,
        });
        self.events.clear();
        result.unwrap_or(Err(CommandError::GameConcluded))
    }

    /// Captures the state of every entity for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            elapsed: self.elapsed,
            enemies: query::enemy_view(&self.world).into_vec(),
            towers: query::tower_view(&self.world).into_vec(),
            projectiles: query::projectile_view(&self.world).into_vec(),
            health: query::health(&self.world),
            currency: query::currency(&self.world),
            waves: WaveProgress {
                started: self.scheduler.waves_started(),
                cleared: u32::try_from(query::waves_cleared(&self.world)).unwrap_or(u32::MAX),
                total: self.scheduler.wave_count(),
            },
            outcome: query::outcome(&self.world),
        }
    }

    /// Digest of the current snapshot, see [`Snapshot::fingerprint`].
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        self.snapshot().fingerprint()
    }

    /// Lifecycle stage reached by the last frame.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Read-only access to the authoritative world for custom queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Applies queued commands and forwards cues. Returns `true` once the game is over.
    fn flush<P>(&mut self, presenter: &mut P) -> bool
    where
        P: Presenter + ?Sized,
    {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        for event in self.events.drain(..) {
            if let Some(notification) = Notification::from_event(&event) {
                presenter.notify(notification);
            }
        }

        if query::outcome(&self.world).is_some() {
            self.progress = Progress::Ending;
            return true;
        }
        false
    }
}
