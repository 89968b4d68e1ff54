#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Home Defence.
//!
//! The world owns every enemy, tower and projectile together with the player
//! economy. It is mutated exclusively through [`apply`], which reports each
//! transition as an [`Event`]. Systems read the world through [`query`].

mod economy;
mod enemies;
mod grid;
mod projectiles;
mod towers;
mod waves;

use std::collections::BTreeMap;

use home_defence_core::{
    Command, CommandError, ConfigError, EnemyId, Event, GameConfig, ImpactEffect, SpawnPointId,
    TileCoord, TowerId, TowerKind, Vec2, WaveId,
};
use tracing::{debug, info};

use crate::{
    economy::Economy,
    enemies::{DamageOutcome, EnemyRoster, Transition},
    projectiles::{Launch, ProjectileRegistry, Resolution},
    towers::TowerRegistry,
    waves::WaveLedger,
};

pub use grid::{Route, Tile, TileGrid};

/// Represents the authoritative Home Defence world state.
#[derive(Clone, Debug)]
pub struct World {
    config: GameConfig,
    grid: TileGrid,
    routes: BTreeMap<SpawnPointId, Route>,
    enemies: EnemyRoster,
    towers: TowerRegistry,
    projectiles: ProjectileRegistry,
    economy: Economy,
    waves: WaveLedger,
}

impl World {
    /// Creates a world for the provided rules and map.
    ///
    /// Fails when the parameter tables are incomplete, the grid declares no
    /// spawn point, or a spawn point has no valid route to home.
    pub fn new(config: GameConfig, grid: TileGrid) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut routes = BTreeMap::new();
        for (spawn_point, _) in grid.spawn_points() {
            let route = Route::derive(&grid, spawn_point, config.tile_size)?;
            let _ = routes.insert(spawn_point, route);
        }
        if routes.is_empty() {
            return Err(ConfigError::NoSpawnPoints);
        }

        Ok(Self {
            enemies: EnemyRoster::new(config.death_linger),
            towers: TowerRegistry::new(),
            projectiles: ProjectileRegistry::new(),
            economy: Economy::new(config.starting_health, config.starting_currency),
            waves: WaveLedger::new(),
            routes,
            grid,
            config,
        })
    }

    fn credit_wave(&mut self, wave: WaveId, reward: Option<u32>, out_events: &mut Vec<Event>) {
        let Some(reward) = reward else {
            return;
        };
        info!(wave = wave.get(), reward, "wave cleared");
        out_events.push(Event::WaveCleared { wave, reward });
        if reward > 0 {
            let currency = self.economy.earn(reward);
            out_events.push(Event::CurrencyChanged { currency });
        }
    }

    fn strike(&mut self, enemy: EnemyId, damage: f32, out_events: &mut Vec<Event>) {
        match self.enemies.strike(enemy, damage) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Wounded { amount, remaining } => {
                out_events.push(Event::EnemyDamaged {
                    enemy,
                    amount,
                    remaining,
                });
            }
            DamageOutcome::Killed {
                amount,
                bounty,
                wave,
            } => {
                out_events.push(Event::EnemyDamaged {
                    enemy,
                    amount,
                    remaining: 0.0,
                });
                debug!(enemy = enemy.get(), bounty, "enemy killed");
                out_events.push(Event::EnemyKilled { enemy, bounty });
                if bounty > 0 {
                    let currency = self.economy.earn(bounty);
                    out_events.push(Event::CurrencyChanged { currency });
                }
                let reward = self.waves.record_departure(wave);
                self.credit_wave(wave, reward, out_events);
            }
        }
    }

    fn resolve(&mut self, resolution: Resolution, out_events: &mut Vec<Event>) {
        match resolution {
            Resolution::Expired { projectile } => {
                out_events.push(Event::ProjectileExpired { projectile });
            }
            Resolution::Hit {
                projectile,
                kind,
                enemy,
                impact,
                damage,
                effect,
            } => {
                out_events.push(Event::ProjectileHit {
                    projectile,
                    kind,
                    enemy,
                });
                match effect {
                    ImpactEffect::Single => self.strike(enemy, damage, out_events),
                    ImpactEffect::Slow { factor, duration } => {
                        self.strike(enemy, damage, out_events);
                        self.enemies.apply_slow(enemy, factor, duration);
                    }
                    ImpactEffect::Splash { radius } => {
                        let mut victims = vec![enemy];
                        victims.extend(
                            self.enemies
                                .view()
                                .in_range(impact, radius * self.config.tile_size)
                                .into_iter()
                                .map(|snapshot| snapshot.id)
                                .filter(|victim| *victim != enemy),
                        );
                        for victim in victims {
                            self.strike(victim, damage, out_events);
                        }
                    }
                }
            }
        }
    }

    fn place_tower(&mut self, kind: TowerKind, tile: TileCoord) -> Result<TowerId, CommandError> {
        if self.economy.outcome().is_some() {
            return Err(CommandError::GameConcluded);
        }
        if !self.grid.is_placeable(tile) {
            return Err(CommandError::InvalidTile);
        }
        let cost = self
            .config
            .tower(kind)
            .and_then(|stats| stats.placement_cost())
            .ok_or(CommandError::InvalidTile)?;
        let _ = self.economy.spend(cost)?;

        self.grid.set_tower(tile, true);
        Ok(self
            .towers
            .insert(kind, tile, tile.center(self.config.tile_size)))
    }

    fn upgrade_tower(&mut self, tile: TileCoord) -> Result<(TowerId, u32), CommandError> {
        if self.economy.outcome().is_some() {
            return Err(CommandError::GameConcluded);
        }
        let id = self.towers.at(tile).ok_or(CommandError::NoTowerAtTile)?;
        let tower = self.towers.get_mut(id).ok_or(CommandError::NoTowerAtTile)?;
        let next_level = tower.level.saturating_add(1);
        let cost = self
            .config
            .tower(tower.kind)
            .and_then(|stats| stats.level(next_level))
            .map(|level| level.cost)
            .ok_or(CommandError::MaxLevelReached)?;
        let _ = self.economy.spend(cost)?;

        tower.level = next_level;
        Ok((id, next_level))
    }

    fn fire(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(aim) = self.enemies.alive_position(target) else {
            debug!(tower = tower.get(), enemy = target.get(), "fire ignored: target gone");
            return;
        };
        let tile_size = self.config.tile_size;
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if !state.cooldown.is_zero() {
            return;
        }
        let Some(stats) = self.config.tower(state.kind) else {
            return;
        };
        let Some(level) = stats.level(state.level) else {
            return;
        };
        let reachable = self
            .enemies
            .view()
            .in_range(state.position, level.range * tile_size)
            .iter()
            .any(|enemy| enemy.id == target);
        if !reachable {
            debug!(tower = tower.get(), enemy = target.get(), "fire ignored: out of range");
            return;
        }

        state.cooldown = level.fire_interval;
        state.target = Some(target);
        state.face(aim);
        let kind = stats.projectile;
        let projectile = self.projectiles.launch(Launch {
            kind,
            tower,
            target,
            origin: state.position,
            aim,
            damage: level.damage,
        });
        out_events.push(Event::ProjectileFired {
            projectile,
            kind,
            tower,
            target,
        });
    }

    fn conclude(&mut self, out_events: &mut Vec<Event>) {
        let resolved = self.waves.all_resolved() && self.enemies.is_empty();
        if let Some(outcome) = self.economy.conclude(resolved) {
            info!(?outcome, health = self.economy.health(), "game over");
            out_events.push(Event::GameOver { outcome });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the game has concluded the world is frozen: simulation commands are
/// ignored and player commands are rejected with
/// [`CommandError::GameConcluded`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let concluded = world.economy.outcome().is_some();

    match command {
        Command::PlaceTower { kind, tile } => match world.place_tower(kind, tile) {
            Ok(tower) => {
                debug!(tower = tower.get(), ?kind, ?tile, "tower placed");
                out_events.push(Event::TowerPlaced { tower, kind, tile });
                out_events.push(Event::CurrencyChanged {
                    currency: world.economy.currency(),
                });
            }
            Err(reason) => {
                debug!(?kind, ?tile, %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, tile, reason });
            }
        },
        Command::UpgradeTower { tile } => match world.upgrade_tower(tile) {
            Ok((tower, level)) => {
                debug!(tower = tower.get(), level, "tower upgraded");
                out_events.push(Event::TowerUpgraded { tower, level });
                out_events.push(Event::CurrencyChanged {
                    currency: world.economy.currency(),
                });
            }
            Err(reason) => {
                debug!(?tile, %reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected { tile, reason });
            }
        },
        _ if concluded => return,
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });

            let mut transitions = Vec::new();
            world.enemies.advance(dt, &world.routes, &mut transitions);
            for transition in transitions {
                match transition {
                    Transition::Leaked {
                        enemy,
                        wave,
                        damage,
                    } => {
                        debug!(enemy = enemy.get(), damage, "enemy leaked");
                        out_events.push(Event::EnemyLeaked { enemy, damage });
                        let health = world.economy.suffer_leak(damage);
                        out_events.push(Event::HealthChanged { health });
                        let reward = world.waves.record_departure(wave);
                        world.credit_wave(wave, reward, out_events);
                    }
                    Transition::Removed { enemy } => {
                        out_events.push(Event::EnemyRemoved { enemy });
                    }
                    Transition::Healed { enemy, amount } => {
                        out_events.push(Event::EnemyHealed { enemy, amount });
                    }
                }
            }

            world.towers.cool_down(dt);
            for tower in world.towers.iter_mut() {
                let aim = tower
                    .target
                    .and_then(|target| world.enemies.alive_position(target));
                if let Some(aim) = aim {
                    tower.face(aim);
                }
            }
        }
        Command::SpawnEnemy {
            kind,
            spawn_point,
            wave,
        } => {
            let (Some(stats), Some(route)) =
                (world.config.enemy(kind), world.routes.get(&spawn_point))
            else {
                debug!(?kind, spawn_point = spawn_point.get(), "spawn ignored");
                return;
            };
            let enemy = world
                .enemies
                .spawn(kind, stats, route, wave, world.config.tile_size);
            world.waves.record_spawn(wave);
            out_events.push(Event::EnemySpawned {
                enemy,
                kind,
                spawn_point,
                wave,
            });
        }
        Command::CloseWave { wave, reward } => {
            let due = world.waves.close(wave, reward);
            world.credit_wave(wave, due, out_events);
        }
        Command::FinishWaves => world.waves.finish(),
        Command::AimTower { tower, target } => {
            let aim = target.and_then(|target| world.enemies.alive_position(target));
            if let Some(state) = world.towers.get_mut(tower) {
                if state.target != target {
                    state.target = target;
                    debug!(tower = tower.get(), ?target, "tower retargeted");
                    out_events.push(Event::TowerRetargeted { tower, target });
                }
                if let Some(aim) = aim {
                    state.face(aim);
                }
            }
        }
        Command::FireProjectile { tower, target } => world.fire(tower, target, out_events),
        Command::AdvanceProjectiles { dt } => {
            let view = world.enemies.view();
            let tile_size = world.config.tile_size;
            let bounds = Vec2::new(world.grid.width(tile_size), world.grid.height(tile_size));

            let mut resolutions = Vec::new();
            world
                .projectiles
                .advance(dt, &view, &world.config, bounds, &mut resolutions);
            for resolution in resolutions {
                world.resolve(resolution, out_events);
            }
        }
    }

    world.conclude(out_events);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use home_defence_core::{
        EnemyView, GameConfig, GameOutcome, ProjectileView, SpawnPointId, TowerView,
    };

    use super::{Route, TileGrid, World};

    /// Rules the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Provides read-only access to the world's tile grid, tower flags included.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Route followed by enemies entering at the spawn point.
    #[must_use]
    pub fn route(world: &World, spawn_point: SpawnPointId) -> Option<&Route> {
        world.routes.get(&spawn_point)
    }

    /// Every derived route in spawn point order.
    pub fn routes(world: &World) -> impl Iterator<Item = &Route> {
        world.routes.values()
    }

    /// Captures a read-only view of the enemies, dying ones included.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        world.enemies.view()
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let tile_size = world.config.tile_size;
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .filter_map(|tower| {
                    world
                        .config
                        .tower(tower.kind)
                        .map(|stats| tower.snapshot(stats, tile_size))
                })
                .collect(),
        )
    }

    /// Captures a read-only view of projectiles in flight or resolving.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(world.projectiles.snapshots())
    }

    /// Remaining home health.
    #[must_use]
    pub fn health(world: &World) -> u32 {
        world.economy.health()
    }

    /// Currency held by the player.
    #[must_use]
    pub fn currency(world: &World) -> u32 {
        world.economy.currency()
    }

    /// Final result, once the game has concluded.
    #[must_use]
    pub fn outcome(world: &World) -> Option<GameOutcome> {
        world.economy.outcome()
    }

    /// Number of waves whose reward has been paid.
    #[must_use]
    pub fn waves_cleared(world: &World) -> usize {
        world.waves.cleared_count()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use home_defence_core::{EnemyKind, GameOutcome, TowerKind};

    fn grid() -> TileGrid {
        TileGrid::from_rows(&["....", ">>>H", "...."])
            .expect("grid")
            .with_spawn_point(SpawnPointId::new(0), TileCoord::new(0, 1))
    }

    fn config() -> GameConfig {
        GameConfig {
            tile_size: 10.0,
            starting_health: 20,
            starting_currency: 100,
            ..GameConfig::default()
        }
    }

    fn spawn(world: &mut World, kind: EnemyKind, wave: u32, events: &mut Vec<Event>) {
        apply(
            world,
            Command::SpawnEnemy {
                kind,
                spawn_point: SpawnPointId::new(0),
                wave: WaveId::new(wave),
            },
            events,
        );
    }

    #[test]
    fn world_without_spawn_points_is_rejected() {
        let grid = TileGrid::from_rows(&[">>H"]).expect("grid");
        assert_eq!(
            World::new(config(), grid).err(),
            Some(ConfigError::NoSpawnPoints)
        );
    }

    #[test]
    fn placement_on_occupied_tile_is_rejected_without_debit() {
        let mut world = World::new(config(), grid()).expect("world");
        let mut events = Vec::new();
        let tile = TileCoord::new(1, 0);

        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Archer,
                tile,
            },
            &mut events,
        );
        let after_first = query::currency(&world);
        assert_eq!(after_first, 50);

        events.clear();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Archer,
                tile,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TowerPlacementRejected {
                kind: TowerKind::Archer,
                tile,
                reason: CommandError::InvalidTile,
            }]
        );
        assert_eq!(query::currency(&world), after_first);
    }

    #[test]
    fn placement_checks_tile_before_funds() {
        let mut world = World::new(config(), grid()).expect("world");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Gunner,
                tile: TileCoord::new(1, 1),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Gunner,
                tile: TileCoord::new(1, 2),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::TowerPlacementRejected {
                    kind: TowerKind::Gunner,
                    tile: TileCoord::new(1, 1),
                    reason: CommandError::InvalidTile,
                },
                Event::TowerPlacementRejected {
                    kind: TowerKind::Gunner,
                    tile: TileCoord::new(1, 2),
                    reason: CommandError::InsufficientFunds {
                        required: 120,
                        available: 100,
                    },
                },
            ]
        );
    }

    #[test]
    fn upgrade_walks_the_level_table() {
        let mut world = World::new(
            GameConfig {
                starting_currency: 1_000,
                ..config()
            },
            grid(),
        )
        .expect("world");
        let mut events = Vec::new();
        let tile = TileCoord::new(0, 0);

        apply(&mut world, Command::UpgradeTower { tile }, &mut events);
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Archer,
                tile,
            },
            &mut events,
        );
        events.clear();
        apply(&mut world, Command::UpgradeTower { tile }, &mut events);
        apply(&mut world, Command::UpgradeTower { tile }, &mut events);
        apply(&mut world, Command::UpgradeTower { tile }, &mut events);

        let tower = TowerId::new(0);
        assert_eq!(
            events,
            vec![
                Event::TowerUpgraded { tower, level: 1 },
                Event::CurrencyChanged { currency: 910 },
                Event::TowerUpgraded { tower, level: 2 },
                Event::CurrencyChanged { currency: 850 },
                Event::TowerUpgradeRejected {
                    tile,
                    reason: CommandError::MaxLevelReached,
                },
            ]
        );
    }

    #[test]
    fn leaks_drain_health_until_defeat() {
        let config = GameConfig {
            enemies: BTreeMap::from([(
                EnemyKind::Slime,
                home_defence_core::EnemyStats {
                    speed: 10.0,
                    max_health: 10.0,
                    armor: 0.0,
                    bounty: 1,
                    leak_damage: 5,
                    aura: None,
                },
            )]),
            ..config()
        };
        let mut world = World::new(config, grid()).expect("world");
        let mut events = Vec::new();

        spawn(&mut world, EnemyKind::Slime, 0, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert_eq!(query::health(&world), 15);
        assert_eq!(query::outcome(&world), None);

        for _ in 0..3 {
            spawn(&mut world, EnemyKind::Slime, 0, &mut events);
        }
        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );

        assert_eq!(query::health(&world), 0);
        assert_eq!(query::outcome(&world), Some(GameOutcome::Defeat));
        let game_overs = events
            .iter()
            .filter(|event| matches!(event, Event::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert!(events.is_empty(), "world is frozen after the game ends");
    }

    #[test]
    fn empty_plan_ends_in_victory() {
        let mut world = World::new(config(), grid()).expect("world");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::CloseWave {
                wave: WaveId::new(0),
                reward: 25,
            },
            &mut events,
        );
        assert_eq!(query::outcome(&world), None);
        apply(&mut world, Command::FinishWaves, &mut events);

        assert_eq!(
            events,
            vec![
                Event::WaveCleared {
                    wave: WaveId::new(0),
                    reward: 25,
                },
                Event::CurrencyChanged { currency: 125 },
                Event::GameOver {
                    outcome: GameOutcome::Victory,
                },
            ]
        );
        assert_eq!(query::waves_cleared(&world), 1);
    }

    #[test]
    fn fire_requires_ready_tower_and_target_in_range() {
        let mut world = World::new(config(), grid()).expect("world");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Archer,
                tile: TileCoord::new(1, 0),
            },
            &mut events,
        );
        spawn(&mut world, EnemyKind::Slime, 0, &mut events);
        events.clear();

        let tower = TowerId::new(0);
        let target = EnemyId::new(0);
        apply(&mut world, Command::FireProjectile { tower, target }, &mut events);
        apply(&mut world, Command::FireProjectile { tower, target }, &mut events);

        assert_eq!(events.len(), 1, "second shot waits for the cooldown");
        assert!(matches!(
            events[0],
            Event::ProjectileFired { tower: fired, target: aimed, .. }
                if fired == tower && aimed == target
        ));
        let snapshot = query::tower_view(&world).get(tower).copied().expect("tower");
        assert_eq!(snapshot.target, Some(target));
        assert_eq!(snapshot.cooldown, Duration::from_millis(800));

        events.clear();
        apply(
            &mut world,
            Command::FireProjectile {
                tower,
                target: EnemyId::new(42),
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn overlapping_lethal_hits_pay_one_bounty() {
        let mut world = World::new(
            GameConfig {
                starting_currency: 1_000,
                ..config()
            },
            grid(),
        )
        .expect("world");
        let mut events = Vec::new();
        for column in [1, 2] {
            apply(
                &mut world,
                Command::PlaceTower {
                    kind: TowerKind::Archer,
                    tile: TileCoord::new(column, 0),
                },
                &mut events,
            );
        }
        spawn(&mut world, EnemyKind::Slime, 0, &mut events);
        if let Some(enemy) = world.enemies.alive_position(EnemyId::new(0)) {
            assert_eq!(enemy, Vec2::new(5.0, 15.0));
        }
        let _ = world.enemies.apply_damage(EnemyId::new(0), 90.0);

        for tower in [TowerId::new(0), TowerId::new(1)] {
            apply(
                &mut world,
                Command::FireProjectile {
                    tower,
                    target: EnemyId::new(0),
                },
                &mut events,
            );
        }
        let before = query::currency(&world);
        events.clear();
        apply(
            &mut world,
            Command::AdvanceProjectiles {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );

        let kills = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyKilled { .. }))
            .count();
        let hits = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileHit { .. }))
            .count();
        assert_eq!(hits, 2);
        assert_eq!(kills, 1);
        assert_eq!(query::currency(&world), before + 10);
    }

    #[test]
    fn shell_splash_strikes_each_alive_enemy_in_the_blast_once() {
        let mut world = World::new(
            GameConfig {
                starting_currency: 1_000,
                ..config()
            },
            grid(),
        )
        .expect("world");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Gunner,
                tile: TileCoord::new(1, 0),
            },
            &mut events,
        );
        spawn(&mut world, EnemyKind::Slime, 0, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(2),
            },
            &mut events,
        );
        for _ in 0..3 {
            spawn(&mut world, EnemyKind::Slime, 0, &mut events);
        }
        let _ = world.enemies.apply_damage(EnemyId::new(3), 1_000.0);

        events.clear();
        apply(
            &mut world,
            Command::FireProjectile {
                tower: TowerId::new(0),
                target: EnemyId::new(1),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AdvanceProjectiles {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );

        let struck: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                Event::EnemyDamaged { enemy, amount, .. } => {
                    assert!((amount - 60.0).abs() < f32::EPSILON);
                    Some(enemy.get())
                }
                _ => None,
            })
            .collect();
        assert_eq!(struck, vec![1, 2]);

        let view = query::enemy_view(&world);
        let outside = view.get(EnemyId::new(0)).expect("enemy outside the blast");
        assert_eq!(outside.health, outside.max_health);
        let dying = view.get(EnemyId::new(3)).expect("dying enemy");
        assert_eq!(dying.status, home_defence_core::EnemyStatus::Dying);
    }

    #[test]
    fn axe_hit_slows_the_target_on_the_next_tick() {
        let mut world = World::new(config(), grid()).expect("world");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Axeman,
                tile: TileCoord::new(1, 0),
            },
            &mut events,
        );
        spawn(&mut world, EnemyKind::Slime, 0, &mut events);
        let target = EnemyId::new(0);
        apply(
            &mut world,
            Command::FireProjectile {
                tower: TowerId::new(0),
                target,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AdvanceProjectiles {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );

        let before = query::enemy_view(&world).get(target).copied().expect("enemy");
        assert!(before.slowed);
        assert_eq!(before.health, 60.0);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(200),
            },
            &mut events,
        );

        let after = query::enemy_view(&world).get(target).copied().expect("enemy");
        assert!((after.progress - before.progress - 1.0).abs() < 1e-4);
    }

    #[test]
    fn route_progress_never_decreases() {
        let grid = TileGrid::from_rows(&[">>v.", "..v.", "..>H"])
            .expect("grid")
            .with_spawn_point(SpawnPointId::new(0), TileCoord::new(0, 0));
        let mut world = World::new(config(), grid).expect("world");
        let mut events = Vec::new();
        let mut seen: BTreeMap<EnemyId, f32> = BTreeMap::new();
        let steps = [0, 16, 250, 1_000, 33, 0, 500, 16, 2_000, 750, 5, 1_500];

        for (round, millis) in (0u32..).zip(steps) {
            let kind = if round % 2 == 0 {
                EnemyKind::Slime
            } else {
                EnemyKind::Goblin
            };
            spawn(&mut world, kind, 0, &mut events);
            match round % 3 {
                0 => world.enemies.apply_slow(
                    EnemyId::new(round.saturating_sub(1)),
                    0.25,
                    Duration::from_millis(600),
                ),
                1 => {
                    let _ = world.enemies.apply_damage(EnemyId::new(round), 1_000.0);
                }
                _ => {}
            }

            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(millis),
                },
                &mut events,
            );

            for enemy in query::enemy_view(&world).iter() {
                if let Some(previous) = seen.insert(enemy.id, enemy.progress) {
                    assert!(
                        enemy.progress >= previous,
                        "enemy {} went back from {previous} to {}",
                        enemy.id.get(),
                        enemy.progress
                    );
                }
            }
        }

        assert!(
            seen.values().any(|progress| *progress > 20.0),
            "some enemy walked past the first turn"
        );
    }
}
