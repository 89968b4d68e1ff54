#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that keeps every tower pointed at a valid enemy.
//!
//! A tower keeps its current target while that enemy is alive and within
//! range. Otherwise it re-acquires one using the policy of its kind:
//! [`TargetPolicy::First`] prefers the enemy with the least route left before
//! home, [`TargetPolicy::Nearest`] the closest one and
//! [`TargetPolicy::Strongest`] the one with the most health. Ties go to the
//! lowest enemy identifier.

use home_defence_core::{
    Command, EnemyId, EnemySnapshot, EnemyView, TargetPolicy, TowerSnapshot, TowerView,
};

/// Tower targeting system. Every decision is derived from the views it is handed.
#[derive(Debug, Default)]
pub struct TowerTargeting;

impl TowerTargeting {
    /// Creates a new tower targeting system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits `AimTower` commands for towers whose target must change.
    ///
    /// Towers that keep their target produce no command, so the world only
    /// hears about actual retargeting.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<Command>) {
        for tower in towers.iter() {
            let reachable = enemies.in_range(tower.position, tower.range);
            let keeps_target = tower
                .target
                .is_some_and(|target| reachable.iter().any(|enemy| enemy.id == target));
            if keeps_target {
                continue;
            }

            let acquired = acquire(tower, &reachable);
            if acquired != tower.target {
                out.push(Command::AimTower {
                    tower: tower.id,
                    target: acquired,
                });
            }
        }
    }
}

fn acquire(tower: &TowerSnapshot, reachable: &[&EnemySnapshot]) -> Option<EnemyId> {
    let mut best: Option<BestCandidate> = None;

    for candidate in reachable {
        let rank = match tower.policy {
            TargetPolicy::First => candidate.remaining,
            TargetPolicy::Nearest => candidate.position.distance_squared(tower.position),
            TargetPolicy::Strongest => -candidate.health,
        };
        let current = BestCandidate {
            rank,
            enemy: candidate.id,
        };

        match &mut best {
            Some(existing) => {
                if current.precedes(existing) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }

    best.map(|candidate| candidate.enemy)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    /// Lower ranks are preferred.
    rank: f32,
    enemy: EnemyId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        match self.rank.total_cmp(&other.rank) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.enemy < other.enemy,
        }
    }
}
