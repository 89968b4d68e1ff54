#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Home Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems and adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing every transition that occurred. Systems read immutable views
//! ([`EnemyView`], [`TowerView`], [`ProjectileView`]) and respond exclusively
//! with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;

pub use config::{
    EnemyStats, GameConfig, HealingAura, ImpactEffect, ProjectileStats, SpawnEntry, TowerLevel,
    TowerStats, WaveDefinition, WavePlan,
};
pub use glam::Vec2;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances enemies along their routes and winds down tower cooldowns.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new enemy enter the map at the provided spawn point.
    SpawnEnemy {
        /// Kind of enemy to create.
        kind: EnemyKind,
        /// Spawn point whose route the enemy follows.
        spawn_point: SpawnPointId,
        /// Wave that scheduled the spawn.
        wave: WaveId,
    },
    /// Declares that the scheduler emitted every spawn belonging to a wave.
    CloseWave {
        /// Wave that finished spawning.
        wave: WaveId,
        /// Currency credited once every enemy of the wave is gone.
        reward: u32,
    },
    /// Declares that the scheduler has no further waves to run.
    FinishWaves,
    /// Assigns or clears the enemy a tower is tracking.
    AimTower {
        /// Tower whose target changes.
        tower: TowerId,
        /// Enemy to track, or `None` to drop the current target.
        target: Option<EnemyId>,
    },
    /// Requests that a ready tower launch a projectile at its target.
    FireProjectile {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy the projectile is aimed at.
        target: EnemyId,
    },
    /// Moves projectiles and resolves their collisions.
    AdvanceProjectiles {
        /// Duration of simulated time the projectiles travel for.
        dt: Duration,
    },
    /// Requests placement of a tower on the provided tile.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Tile that should host the tower.
        tile: TileCoord,
    },
    /// Requests that the tower standing on the provided tile gain a level.
    UpgradeTower {
        /// Tile hosting the tower to upgrade.
        tile: TileCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the map.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Spawn point the enemy starts from.
        spawn_point: SpawnPointId,
        /// Wave the enemy belongs to.
        wave: WaveId,
    },
    /// Reports that an enemy lost health.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Health removed by the hit.
        amount: f32,
        /// Health remaining after the hit.
        remaining: f32,
    },
    /// Reports that an enemy regained health from a healing aura.
    EnemyHealed {
        /// Enemy that was healed.
        enemy: EnemyId,
        /// Health restored.
        amount: f32,
    },
    /// Reports that an enemy ran out of health. Emitted once per enemy.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Currency awarded for the kill.
        bounty: u32,
    },
    /// Reports that an enemy reached home. Emitted once per enemy.
    EnemyLeaked {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Health the player lost.
        damage: u32,
    },
    /// Confirms that a dying enemy finished lingering and left the world.
    EnemyRemoved {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Tile occupied by the tower.
        tile: TileCoord,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Tile provided in the placement request.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: CommandError,
    },
    /// Confirms that a tower gained a level.
    TowerUpgraded {
        /// Tower that was upgraded.
        tower: TowerId,
        /// Level reached by the tower.
        level: u32,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Tile provided in the upgrade request.
        tile: TileCoord,
        /// Specific reason the upgrade failed.
        reason: CommandError,
    },
    /// Reports that a tower started tracking a different enemy or dropped its target.
    TowerRetargeted {
        /// Tower whose target changed.
        tower: TowerId,
        /// Enemy now tracked, if any.
        target: Option<EnemyId>,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Kind of projectile launched.
        kind: ProjectileKind,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile was aimed at.
        target: EnemyId,
    },
    /// Reports that a projectile struck an enemy.
    ProjectileHit {
        /// Projectile that resolved.
        projectile: ProjectileId,
        /// Kind of the projectile.
        kind: ProjectileKind,
        /// Enemy struck first by the projectile.
        enemy: EnemyId,
    },
    /// Reports that a projectile resolved without striking anything.
    ProjectileExpired {
        /// Projectile that expired.
        projectile: ProjectileId,
    },
    /// Reports the player's health after it changed.
    HealthChanged {
        /// Remaining health.
        health: u32,
    },
    /// Reports the player's currency after it changed.
    CurrencyChanged {
        /// Currency balance.
        currency: u32,
    },
    /// Reports that every enemy of a closed wave is gone and its reward was paid.
    WaveCleared {
        /// Wave that was cleared.
        wave: WaveId,
        /// Currency credited for the wave.
        reward: u32,
    },
    /// Announces the end of the game. Emitted once.
    GameOver {
        /// Final result.
        outcome: GameOutcome,
    },
}

/// Final result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Every wave was cleared while home still had health.
    Victory,
    /// Home health reached zero.
    Defeat,
}


/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
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

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a spawn point registered on the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnPointId(u32);

impl SpawnPointId {
    /// Creates a new spawn point identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the spawn point identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Zero-based index of a wave within the wave plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the wave identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// World-space centre of the tile for the provided tile edge length.
    #[must_use]
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.column as f32 + 0.5) * tile_size,
            (self.row as f32 + 0.5) * tile_size,
        )
    }

    /// Returns the neighbouring tile reached by following `direction`.
    ///
    /// `None` is returned for non-moving directions and when the step would
    /// underflow the grid origin.
    #[must_use]
    pub fn step(self, direction: TileDirection) -> Option<TileCoord> {
        match direction {
            TileDirection::Up => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            TileDirection::Down => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            TileDirection::Left => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
            TileDirection::Right => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
            TileDirection::None | TileDirection::Home => None,
        }
    }
}

/// Path classification stored on every tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileDirection {
    /// Off-path tile; buildable unless decorated.
    #[default]
    None,
    /// Path segment leading toward decreasing rows.
    Up,
    /// Path segment leading toward increasing rows.
    Down,
    /// Path segment leading toward decreasing columns.
    Left,
    /// Path segment leading toward increasing columns.
    Right,
    /// The base enemies try to reach.
    Home,
}

impl TileDirection {
    /// Reports whether the tile belongs to the enemy path.
    #[must_use]
    pub const fn is_path(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Enemy archetypes indexing into the enemy parameter table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Weak, common enemy.
    Slime,
    /// Slow, armoured slime.
    KingSlime,
    /// Sturdy walker.
    Skeleton,
    /// Fast runner.
    Goblin,
    /// Support enemy that heals nearby allies.
    GoblinPriest,
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Rapid single-target tower firing arrows.
    Archer,
    /// Short-range tower throwing slowing axes.
    Axeman,
    /// Slow long-range tower lobbing explosive shells.
    Gunner,
}

impl TowerKind {
    /// Every tower kind in declaration order.
    pub const ALL: [TowerKind; 3] = [Self::Archer, Self::Axeman, Self::Gunner];
}

/// Types of projectiles launched by towers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Fired by archers.
    Arrow,
    /// Thrown by axemen.
    Axe,
    /// Lobbed by gunners.
    Shell,
}

/// Rule a tower uses to pick among enemies within range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Enemy furthest along its route, i.e. closest to home.
    #[default]
    First,
    /// Enemy closest to the tower.
    Nearest,
    /// Enemy with the most remaining health.
    Strongest,
}

/// Way a projectile travels once launched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelPolicy {
    /// Follows the target's current position every tick.
    Homing,
    /// Flies along the vector fixed at launch and strikes whatever it meets.
    Ballistic,
}

/// Reasons a player command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CommandError {
    /// The tile is off the grid, on the path, decorated, or already occupied.
    #[error("tile cannot host a tower")]
    InvalidTile,
    /// The player cannot afford the requested action.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Cost of the requested action.
        required: u32,
        /// Currency held by the player.
        available: u32,
    },
    /// No tower stands on the requested tile.
    #[error("no tower stands on the tile")]
    NoTowerAtTile,
    /// The tower already reached the last level of its table.
    #[error("tower already reached its maximum level")]
    MaxLevelReached,
    /// The game already ended, so commands are no longer accepted.
    #[error("the game has concluded")]
    GameConcluded,
}

/// Construction-time violations that indicate a broken level or parameter table.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no tiles.
    #[error("tile grid is empty")]
    EmptyGrid,
    /// A legend row has a different width than the first row.
    #[error("grid row {row} has {found} tiles, expected {expected}")]
    RaggedGrid {
        /// Offending row.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A legend symbol is not recognised.
    #[error("unknown tile symbol {symbol:?} at {tile:?}")]
    UnknownTileSymbol {
        /// Offending character.
        symbol: char,
        /// Tile carrying the symbol.
        tile: TileCoord,
    },
    /// The grid has no home tile.
    #[error("grid has no home tile")]
    MissingHome,
    /// The grid has more than one home tile.
    #[error("grid has several home tiles: {first:?} and {second:?}")]
    MultipleHomes {
        /// First home encountered.
        first: TileCoord,
        /// Second home encountered.
        second: TileCoord,
    },
    /// The grid declares no spawn points.
    #[error("grid declares no spawn points")]
    NoSpawnPoints,
    /// A spawn point lies outside the grid or off the path.
    #[error("spawn point {spawn_point:?} at {tile:?} is not on the path")]
    InvalidSpawnPoint {
        /// Offending spawn point.
        spawn_point: SpawnPointId,
        /// Tile it was registered at.
        tile: TileCoord,
    },
    /// Following the path from a spawn point leaves the grid.
    #[error("route from {spawn_point:?} leaves the grid at {tile:?}")]
    RouteLeavesGrid {
        /// Spawn point whose route is broken.
        spawn_point: SpawnPointId,
        /// Last tile inside the grid.
        tile: TileCoord,
    },
    /// Following the path from a spawn point reaches a non-path tile.
    #[error("route from {spawn_point:?} is interrupted at {tile:?}")]
    RouteInterrupted {
        /// Spawn point whose route is broken.
        spawn_point: SpawnPointId,
        /// Non-path tile reached by the walk.
        tile: TileCoord,
    },
    /// Following the path from a spawn point revisits a tile.
    #[error("route from {spawn_point:?} loops at {tile:?}")]
    RouteLoops {
        /// Spawn point whose route is broken.
        spawn_point: SpawnPointId,
        /// First tile visited twice.
        tile: TileCoord,
    },
    /// The tile edge length is not a positive finite number.
    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(f32),
    /// An enemy kind lacks parameters.
    #[error("no parameters for enemy kind {0:?}")]
    MissingEnemyStats(EnemyKind),
    /// An enemy kind carries parameters outside their valid range.
    #[error("invalid parameters for enemy kind {0:?}")]
    InvalidEnemyStats(EnemyKind),
    /// A tower kind lacks parameters.
    #[error("no parameters for tower kind {0:?}")]
    MissingTowerStats(TowerKind),
    /// A tower kind has an empty level table.
    #[error("tower kind {0:?} has no levels")]
    TowerWithoutLevels(TowerKind),
    /// A projectile kind lacks parameters.
    #[error("no parameters for projectile kind {0:?}")]
    MissingProjectileStats(ProjectileKind),
    /// A projectile kind carries parameters outside their valid range.
    #[error("invalid parameters for projectile kind {0:?}")]
    InvalidProjectileStats(ProjectileKind),
    /// A wave spawns from a spawn point the grid does not declare.
    #[error("wave {wave:?} spawns from unknown spawn point {spawn_point:?}")]
    UnknownSpawnPoint {
        /// Offending wave.
        wave: WaveId,
        /// Spawn point it references.
        spawn_point: SpawnPointId,
    },
}

/// Lifecycle stage of an enemy that is still present in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyStatus {
    /// Walking along its route; can be targeted and hit.
    Alive,
    /// Killed and lingering for the death cue; ignored by towers and projectiles.
    Dying,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Wave the enemy belongs to.
    pub wave: WaveId,
    /// Current world-space position.
    pub position: Vec2,
    /// Arc length travelled along the route, in world units.
    pub progress: f32,
    /// Arc length left before the enemy reaches home, in world units.
    pub remaining: f32,
    /// Remaining health.
    pub health: f32,
    /// Maximum health of the enemy kind.
    pub max_health: f32,
    /// Lifecycle stage.
    pub status: EnemyStatus,
    /// Indicates whether a slow effect is active.
    pub slowed: bool,
}

impl EnemySnapshot {
    /// Remaining health as a fraction of the maximum in `0.0..=1.0`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Reports whether the enemy can still be targeted.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == EnemyStatus::Alive
    }
}

/// Read-only snapshot describing all enemies within the world.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Looks up an enemy regardless of its lifecycle stage.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Looks up an enemy only if it is still alive.
    #[must_use]
    pub fn alive(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.get(id).filter(|snapshot| snapshot.is_alive())
    }

    /// Alive enemies within `radius` of `center`, nearest first.
    ///
    /// Equal distances are ordered by ascending identifier so callers observe a
    /// reproducible sequence.
    #[must_use]
    pub fn in_range(&self, center: Vec2, radius: f32) -> Vec<&EnemySnapshot> {
        let radius_sq = radius * radius;
        let mut found: Vec<(f32, &EnemySnapshot)> = self
            .snapshots
            .iter()
            .filter(|snapshot| snapshot.is_alive())
            .map(|snapshot| (snapshot.position.distance_squared(center), snapshot))
            .filter(|(distance_sq, _)| *distance_sq <= radius_sq)
            .collect();
        found.sort_by(|(left_distance, left), (right_distance, right)| {
            left_distance
                .total_cmp(right_distance)
                .then(left.id.cmp(&right.id))
        });
        found.into_iter().map(|(_, snapshot)| snapshot).collect()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Tile occupied by the tower.
    pub tile: TileCoord,
    /// World-space centre of the tower.
    pub position: Vec2,
    /// Zero-based upgrade level.
    pub level: u32,
    /// Targeting radius in world units at the current level.
    pub range: f32,
    /// Rule used to pick among enemies in range.
    pub policy: TargetPolicy,
    /// Time left before the tower may fire again.
    pub cooldown: Duration,
    /// Enemy currently tracked. May be stale; validate before use.
    pub target: Option<EnemyId>,
    /// Unit vector the tower faces.
    pub facing: Vec2,
}

impl TowerSnapshot {
    /// Reports whether the cooldown elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown.is_zero()
    }
}

/// Read-only snapshot describing all towers placed within the world.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Travel stage of a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectilePhase {
    /// In flight.
    Traveling,
    /// Struck an enemy this tick; removed on the next advance.
    Hit,
    /// Resolved without a hit; removed on the next advance.
    Expired,
}

/// Immutable representation of a single projectile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Kind of projectile.
    pub kind: ProjectileKind,
    /// Tower that launched the projectile.
    pub tower: TowerId,
    /// Current world-space position.
    pub position: Vec2,
    /// Enemy tracked by homing projectiles.
    pub target: Option<EnemyId>,
    /// Travel stage.
    pub phase: ProjectilePhase,
}

/// Read-only snapshot describing all projectiles in flight or resolving.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no projectiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn enemy(id: u32, position: Vec2, status: EnemyStatus) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Slime,
            wave: WaveId::new(0),
            position,
            progress: 0.0,
            remaining: 10.0,
            health: 10.0,
            max_health: 20.0,
            status,
            slowed: false,
        }
    }

    #[test]
    fn tile_center_sits_in_the_middle_of_the_tile() {
        let center = TileCoord::new(2, 1).center(10.0);
        assert_eq!(center, Vec2::new(25.0, 15.0));
    }

    #[test]
    fn stepping_off_the_origin_yields_none() {
        let origin = TileCoord::new(0, 0);
        assert_eq!(origin.step(TileDirection::Up), None);
        assert_eq!(origin.step(TileDirection::Left), None);
        assert_eq!(origin.step(TileDirection::Home), None);
        assert_eq!(
            origin.step(TileDirection::Right),
            Some(TileCoord::new(1, 0))
        );
        assert_eq!(origin.step(TileDirection::Down), Some(TileCoord::new(0, 1)));
    }

    #[test]
    fn command_error_round_trips_through_bincode() {
        assert_round_trip(&CommandError::InsufficientFunds {
            required: 50,
            available: 20,
        });
        assert_round_trip(&CommandError::MaxLevelReached);
    }

    #[test]
    fn tower_kind_round_trips_through_bincode() {
        assert_round_trip(&TowerKind::Gunner);
        assert_round_trip(&TileCoord::new(3, 9));
    }

    #[test]
    fn in_range_orders_by_distance_then_identifier() {
        let view = EnemyView::from_snapshots(vec![
            enemy(5, Vec2::new(3.0, 0.0), EnemyStatus::Alive),
            enemy(2, Vec2::new(0.0, 3.0), EnemyStatus::Alive),
            enemy(9, Vec2::new(1.0, 0.0), EnemyStatus::Alive),
            enemy(1, Vec2::new(10.0, 0.0), EnemyStatus::Alive),
        ]);

        let ids: Vec<u32> = view
            .in_range(Vec2::ZERO, 3.0)
            .into_iter()
            .map(|snapshot| snapshot.id.get())
            .collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }

    #[test]
    fn in_range_skips_dying_enemies() {
        let view = EnemyView::from_snapshots(vec![
            enemy(1, Vec2::ZERO, EnemyStatus::Dying),
            enemy(2, Vec2::new(1.0, 0.0), EnemyStatus::Alive),
        ]);

        let found = view.in_range(Vec2::ZERO, 5.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, EnemyId::new(2));
        assert!(view.alive(EnemyId::new(1)).is_none());
        assert!(view.get(EnemyId::new(1)).is_some());
    }

    #[test]
    fn health_fraction_is_clamped() {
        let mut snapshot = enemy(1, Vec2::ZERO, EnemyStatus::Alive);
        assert!((snapshot.health_fraction() - 0.5).abs() < f32::EPSILON);
        snapshot.health = -4.0;
        assert_eq!(snapshot.health_fraction(), 0.0);
    }
}
