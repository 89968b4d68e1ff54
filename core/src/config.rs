//! Static parameter tables consumed by the world and the wave scheduler.
//!
//! Distances and speeds are expressed in tiles and converted to world units
//! with [`GameConfig::tile_size`]. Durations serialise as floating point
//! seconds.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, EnemyKind, ProjectileKind, SpawnPointId, TargetPolicy, TowerKind, TravelPolicy,
    WaveId,
};

/// Per-kind enemy parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Walking speed in tiles per second.
    pub speed: f32,
    /// Health an enemy of this kind spawns with.
    pub max_health: f32,
    /// Fraction of incoming projectile damage absorbed, in `0.0..1.0`.
    #[serde(default)]
    pub armor: f32,
    /// Currency awarded for a kill.
    pub bounty: u32,
    /// Health the player loses when the enemy reaches home.
    pub leak_damage: u32,
    /// Periodic heal applied to nearby allies.
    #[serde(default)]
    pub aura: Option<HealingAura>,
}

/// Periodic heal emitted by support enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealingAura {
    /// Time between two pulses.
    #[serde(with = "seconds")]
    pub interval: Duration,
    /// Radius of the pulse in tiles.
    pub range: f32,
    /// Health restored to every ally in range, capped at their maximum.
    pub amount: f32,
}

/// Parameters of a single tower level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerLevel {
    /// Targeting radius in tiles.
    pub range: f32,
    /// Damage carried by each projectile.
    pub damage: f32,
    /// Minimum time between two shots.
    #[serde(with = "seconds")]
    pub fire_interval: Duration,
    /// Price of reaching this level; the first level's cost is the placement price.
    pub cost: u32,
}

/// Per-kind tower parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Projectile launched by the tower.
    pub projectile: ProjectileKind,
    /// Rule used to pick a target.
    #[serde(default)]
    pub policy: TargetPolicy,
    /// Level table; index zero describes a freshly placed tower.
    pub levels: Vec<TowerLevel>,
}

impl TowerStats {
    /// Parameters of the provided level, if it exists.
    #[must_use]
    pub fn level(&self, level: u32) -> Option<&TowerLevel> {
        usize::try_from(level)
            .ok()
            .and_then(|index| self.levels.get(index))
    }

    /// Price of placing a new tower of this kind.
    #[must_use]
    pub fn placement_cost(&self) -> Option<u32> {
        self.levels.first().map(|level| level.cost)
    }
}

/// Effect applied when a projectile resolves against an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImpactEffect {
    /// Damages the struck enemy only.
    Single,
    /// Damages and slows the struck enemy.
    Slow {
        /// Speed multiplier while slowed, in `0.0..=1.0`.
        factor: f32,
        /// How long the slow lasts.
        #[serde(with = "seconds")]
        duration: Duration,
    },
    /// Damages every alive enemy around the impact point.
    Splash {
        /// Blast radius in tiles.
        radius: f32,
    },
}

/// Per-kind projectile parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileStats {
    /// Flight speed in tiles per second.
    pub speed: f32,
    /// Whether the projectile tracks its target.
    pub travel: TravelPolicy,
    /// Distance in tiles at which the projectile connects with an enemy.
    pub hit_radius: f32,
    /// Distance in tiles after which a projectile expires.
    pub max_range: f32,
    /// Effect applied on impact.
    pub effect: ImpactEffect,
}

/// Static rules of a game: economy, map scale and every parameter table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Edge length of a tile in world units.
    pub tile_size: f32,
    /// Home health at the start of the game.
    pub starting_health: u32,
    /// Currency at the start of the game.
    pub starting_currency: u32,
    /// How long a killed enemy lingers before removal.
    #[serde(with = "seconds")]
    pub death_linger: Duration,
    /// Enemy parameter table.
    pub enemies: BTreeMap<EnemyKind, EnemyStats>,
    /// Tower parameter table.
    pub towers: BTreeMap<TowerKind, TowerStats>,
    /// Projectile parameter table.
    pub projectiles: BTreeMap<ProjectileKind, ProjectileStats>,
}

impl GameConfig {
    /// Parameters of an enemy kind.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> Option<&EnemyStats> {
        self.enemies.get(&kind)
    }

    /// Parameters of a tower kind.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> Option<&TowerStats> {
        self.towers.get(&kind)
    }

    /// Parameters of a projectile kind.
    #[must_use]
    pub fn projectile(&self, kind: ProjectileKind) -> Option<&ProjectileStats> {
        self.projectiles.get(&kind)
    }

    /// Checks that every table is complete and every value is usable.
    ///
    /// Every tower kind must be present with at least one level, and every
    /// projectile a tower launches must be described. Enemy kinds are only
    /// required when a wave references them, see [`WavePlan::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(ConfigError::InvalidTileSize(self.tile_size));
        }

        for (kind, stats) in &self.enemies {
            let valid = stats.speed.is_finite()
                && stats.speed >= 0.0
                && stats.max_health.is_finite()
                && stats.max_health > 0.0
                && (0.0..1.0).contains(&stats.armor)
                && stats
                    .aura
                    .map_or(true, |aura| aura.range >= 0.0 && aura.amount >= 0.0);
            if !valid {
                return Err(ConfigError::InvalidEnemyStats(*kind));
            }
        }

        for kind in TowerKind::ALL {
            let stats = self
                .tower(kind)
                .ok_or(ConfigError::MissingTowerStats(kind))?;
            if stats.levels.is_empty() {
                return Err(ConfigError::TowerWithoutLevels(kind));
            }
            if self.projectile(stats.projectile).is_none() {
                return Err(ConfigError::MissingProjectileStats(stats.projectile));
            }
        }

        for (kind, stats) in &self.projectiles {
            let effect_valid = match stats.effect {
                ImpactEffect::Single => true,
                ImpactEffect::Slow { factor, .. } => (0.0..=1.0).contains(&factor),
                ImpactEffect::Splash { radius } => radius >= 0.0,
            };
            let valid = stats.speed.is_finite()
                && stats.speed > 0.0
                && stats.hit_radius >= 0.0
                && stats.max_range > 0.0
                && effect_valid;
            if !valid {
                return Err(ConfigError::InvalidProjectileStats(*kind));
            }
        }

        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let enemies = BTreeMap::from([
            (EnemyKind::Slime, enemy(1.0, 100.0, 0.0, 10, 1)),
            (EnemyKind::KingSlime, enemy(0.6, 350.0, 0.2, 30, 2)),
            (EnemyKind::Skeleton, enemy(1.2, 150.0, 0.1, 15, 1)),
            (EnemyKind::Goblin, enemy(1.6, 120.0, 0.0, 15, 1)),
            (
                EnemyKind::GoblinPriest,
                EnemyStats {
                    aura: Some(HealingAura {
                        interval: Duration::from_secs(3),
                        range: 2.0,
                        amount: 20.0,
                    }),
                    ..enemy(1.0, 180.0, 0.0, 25, 1)
                },
            ),
        ]);

        let towers = BTreeMap::from([
            (
                TowerKind::Archer,
                TowerStats {
                    projectile: ProjectileKind::Arrow,
                    policy: TargetPolicy::First,
                    levels: vec![
                        level(5.0, 25.0, 800, 50),
                        level(5.5, 35.0, 700, 40),
                        level(6.0, 45.0, 600, 60),
                    ],
                },
            ),
            (
                TowerKind::Axeman,
                TowerStats {
                    projectile: ProjectileKind::Axe,
                    policy: TargetPolicy::Nearest,
                    levels: vec![
                        level(3.0, 40.0, 1200, 80),
                        level(3.5, 55.0, 1100, 60),
                        level(4.0, 70.0, 1000, 90),
                    ],
                },
            ),
            (
                TowerKind::Gunner,
                TowerStats {
                    projectile: ProjectileKind::Shell,
                    policy: TargetPolicy::Strongest,
                    levels: vec![
                        level(6.0, 60.0, 1800, 120),
                        level(6.5, 80.0, 1600, 100),
                        level(7.0, 100.0, 1400, 140),
                    ],
                },
            ),
        ]);

        let projectiles = BTreeMap::from([
            (
                ProjectileKind::Arrow,
                ProjectileStats {
                    speed: 10.0,
                    travel: TravelPolicy::Homing,
                    hit_radius: 0.25,
                    max_range: 12.0,
                    effect: ImpactEffect::Single,
                },
            ),
            (
                ProjectileKind::Axe,
                ProjectileStats {
                    speed: 7.0,
                    travel: TravelPolicy::Homing,
                    hit_radius: 0.3,
                    max_range: 8.0,
                    effect: ImpactEffect::Slow {
                        factor: 0.5,
                        duration: Duration::from_secs(2),
                    },
                },
            ),
            (
                ProjectileKind::Shell,
                ProjectileStats {
                    speed: 6.0,
                    travel: TravelPolicy::Ballistic,
                    hit_radius: 0.35,
                    max_range: 10.0,
                    effect: ImpactEffect::Splash { radius: 1.2 },
                },
            ),
        ]);

        Self {
            tile_size: 48.0,
            starting_health: 10,
            starting_currency: 100,
            death_linger: Duration::from_millis(400),
            enemies,
            towers,
            projectiles,
        }
    }
}

fn enemy(speed: f32, max_health: f32, armor: f32, bounty: u32, leak_damage: u32) -> EnemyStats {
    EnemyStats {
        speed,
        max_health,
        armor,
        bounty,
        leak_damage,
        aura: None,
    }
}

fn level(range: f32, damage: f32, fire_interval_ms: u64, cost: u32) -> TowerLevel {
    TowerLevel {
        range,
        damage,
        fire_interval: Duration::from_millis(fire_interval_ms),
        cost,
    }
}

/// A single scheduled spawn within a wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Spawn point the enemy enters from.
    #[serde(default = "default_spawn_point")]
    pub spawn_point: SpawnPointId,
    /// Delay since the previous spawn of the wave, or since the wave started.
    #[serde(with = "seconds", default)]
    pub delay: Duration,
}

fn default_spawn_point() -> SpawnPointId {
    SpawnPointId::new(0)
}

/// Ordered spawns plus the pause that precedes them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Pause before the wave starts, measured from the end of the previous wave's spawns.
    #[serde(with = "seconds", default)]
    pub lead_time: Duration,
    /// Currency credited once every enemy of the wave is gone.
    #[serde(default)]
    pub reward: u32,
    /// Spawns in schedule order.
    #[serde(default)]
    pub spawns: Vec<SpawnEntry>,
}

/// Every wave of a level in play order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    /// Waves in play order.
    pub waves: Vec<WaveDefinition>,
}

impl WavePlan {
    /// Creates a plan from the provided waves.
    #[must_use]
    pub fn new(waves: Vec<WaveDefinition>) -> Self {
        Self { waves }
    }

    /// Checks every spawn against the enemy table and the declared spawn points.
    pub fn validate<F>(&self, config: &GameConfig, has_spawn_point: F) -> Result<(), ConfigError>
    where
        F: Fn(SpawnPointId) -> bool,
    {
        for (index, wave) in self.waves.iter().enumerate() {
            let wave_id = WaveId::new(u32::try_from(index).unwrap_or(u32::MAX));
            for entry in &wave.spawns {
                if config.enemy(entry.kind).is_none() {
                    return Err(ConfigError::MissingEnemyStats(entry.kind));
                }
                if !has_spawn_point(entry.spawn_point) {
                    return Err(ConfigError::UnknownSpawnPoint {
                        wave: wave_id,
                        spawn_point: entry.spawn_point,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Serde adapter storing a [`Duration`] as floating point seconds.
pub mod seconds {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialises the duration as seconds.
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    /// Deserialises seconds into a duration, rejecting negative or non-finite values.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| D::Error::custom(format!("invalid duration of {secs} seconds")))
    }
}
