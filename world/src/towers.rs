//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use home_defence_core::{EnemyId, TileCoord, TowerId, TowerKind, TowerSnapshot, TowerStats, Vec2};

/// State of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Tile occupied by the tower.
    pub(crate) tile: TileCoord,
    /// World-space centre of the tile.
    pub(crate) position: Vec2,
    /// Zero-based index into the level table of the kind.
    pub(crate) level: u32,
    pub(crate) cooldown: Duration,
    pub(crate) target: Option<EnemyId>,
    /// Unit vector, kept when the target disappears.
    pub(crate) facing: Vec2,
}

impl TowerState {
    /// Captures the tower together with the stats of its current level.
    pub(crate) fn snapshot(&self, stats: &TowerStats, tile_size: f32) -> TowerSnapshot {
        let range = stats
            .level(self.level)
            .map_or(0.0, |level| level.range * tile_size);
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            tile: self.tile,
            position: self.position,
            level: self.level,
            range,
            policy: stats.policy,
            cooldown: self.cooldown,
            target: self.target,
            facing: self.facing,
        }
    }

    /// Turns the tower toward `point` unless it sits on top of it.
    pub(crate) fn face(&mut self, point: Vec2) {
        if let Some(direction) = (point - self.position).try_normalize() {
            self.facing = direction;
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Clone, Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a fresh level-zero tower and returns its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, tile: TileCoord, position: Vec2) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));

        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                tile,
                position,
                level: 0,
                cooldown: Duration::ZERO,
                target: None,
                facing: Vec2::NEG_Y,
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn at(&self, tile: TileCoord) -> Option<TowerId> {
        self.entries
            .values()
            .find(|tower| tower.tile == tile)
            .map(|tower| tower.id)
    }

    /// Towers in ascending identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    /// Winds every cooldown down by `dt`, flooring at zero.
    pub(crate) fn cool_down(&mut self, dt: Duration) {
        for tower in self.entries.values_mut() {
            tower.cooldown = tower.cooldown.saturating_sub(dt);
        }
    }
}
