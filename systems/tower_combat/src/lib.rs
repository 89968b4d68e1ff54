#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands for ready towers.

use home_defence_core::{Command, EnemyView, TowerView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for towers ready to fire.
    ///
    /// A tower fires when its cooldown elapsed and its tracked enemy is still
    /// alive and within range. The world repeats these checks on apply.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<Command>) {
        self.scratch.clear();

        for tower in towers.iter().filter(|tower| tower.is_ready()) {
            let Some(target) = tower.target else {
                continue;
            };
            let reachable = enemies
                .in_range(tower.position, tower.range)
                .iter()
                .any(|enemy| enemy.id == target);
            if reachable {
                self.scratch.push(Command::FireProjectile {
                    tower: tower.id,
                    target,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use home_defence_core::{
        EnemyId, EnemyKind, EnemySnapshot, EnemyStatus, TargetPolicy, TileCoord, TowerId,
        TowerKind, TowerSnapshot, Vec2, WaveId,
    };
    use std::time::Duration;

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            tower(5, Duration::ZERO, Some(1)),
            tower(2, Duration::ZERO, Some(4)),
            tower(3, Duration::from_millis(250), Some(4)),
        ]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, Vec2::new(1.0, 0.0), EnemyStatus::Alive),
            enemy(4, Vec2::new(0.0, 1.0), EnemyStatus::Alive),
        ]);
        let mut out = Vec::new();

        system.handle(&towers, &enemies, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: EnemyId::new(4),
                },
                Command::FireProjectile {
                    tower: TowerId::new(5),
                    target: EnemyId::new(1),
                },
            ],
        );
    }

    #[test]
    fn towers_without_valid_targets_are_skipped() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            tower(1, Duration::ZERO, None),
            tower(2, Duration::ZERO, Some(7)),
            tower(3, Duration::ZERO, Some(8)),
            tower(4, Duration::ZERO, Some(42)),
        ]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(7, Vec2::new(1.0, 1.0), EnemyStatus::Dying),
            enemy(8, Vec2::new(30.0, 0.0), EnemyStatus::Alive),
        ]);
        let mut out = Vec::new();

        system.handle(&towers, &enemies, &mut out);

        assert!(out.is_empty());
    }

    fn tower(id: u32, cooldown: Duration, target: Option<u32>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Archer,
            tile: TileCoord::new(id, 0),
            position: Vec2::ZERO,
            level: 0,
            range: 3.0,
            policy: TargetPolicy::First,
            cooldown,
            target: target.map(EnemyId::new),
            facing: Vec2::NEG_Y,
        }
    }

    fn enemy(id: u32, position: Vec2, status: EnemyStatus) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Goblin,
            wave: WaveId::new(0),
            position,
            progress: 0.0,
            remaining: 10.0,
            health: 10.0,
            max_health: 10.0,
            status,
            slowed: false,
        }
    }
}
