//! Enemy roster: route following, status effects, damage and removal.

use std::{collections::BTreeMap, time::Duration};

use home_defence_core::{
    EnemyId, EnemyKind, EnemySnapshot, EnemyStats, EnemyStatus, EnemyView, SpawnPointId, Vec2,
    WaveId,
};

use crate::grid::Route;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Lifecycle {
    Alive,
    Dying { remaining: Duration },
}

#[derive(Clone, Copy, Debug)]
struct Slow {
    factor: f32,
    remaining: Duration,
}

#[derive(Clone, Copy, Debug)]
struct Aura {
    interval: Duration,
    range: f32,
    amount: f32,
    elapsed: Duration,
}

impl Aura {
    /// Accumulates time and returns how many pulses fell due.
    fn accumulate(&mut self, dt: Duration) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        let interval = self.interval.as_nanos();
        let pulses = self.elapsed.as_nanos() / interval;
        let leftover = self.elapsed.as_nanos() % interval;
        self.elapsed = Duration::from_nanos(u64::try_from(leftover).unwrap_or(u64::MAX));
        u32::try_from(pulses).unwrap_or(u32::MAX)
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    wave: WaveId,
    spawn_point: SpawnPointId,
    route_length: f32,
    progress: f32,
    position: Vec2,
    health: f32,
    max_health: f32,
    armor: f32,
    speed: f32,
    bounty: u32,
    leak_damage: u32,
    slow: Option<Slow>,
    aura: Option<Aura>,
    lifecycle: Lifecycle,
}

impl Enemy {
    fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    fn effective_speed(&self) -> f32 {
        self.speed * self.slow.map_or(1.0, |slow| slow.factor)
    }

    fn has_arrived(&self) -> bool {
        self.progress >= self.route_length
    }

    fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            wave: self.wave,
            position: self.position,
            progress: self.progress,
            remaining: (self.route_length - self.progress).max(0.0),
            health: self.health,
            max_health: self.max_health,
            status: match self.lifecycle {
                Lifecycle::Alive => EnemyStatus::Alive,
                Lifecycle::Dying { .. } => EnemyStatus::Dying,
            },
            slowed: self.slow.is_some(),
        }
    }
}

/// Transition produced while advancing the roster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Transition {
    Leaked {
        enemy: EnemyId,
        wave: WaveId,
        damage: u32,
    },
    Removed {
        enemy: EnemyId,
    },
    Healed {
        enemy: EnemyId,
        amount: f32,
    },
}

/// Result of applying damage to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DamageOutcome {
    /// The enemy is gone or already dying; nothing happened.
    Ignored,
    Wounded {
        amount: f32,
        remaining: f32,
    },
    /// First lethal hit. Never reported twice for the same enemy.
    Killed {
        amount: f32,
        bounty: u32,
        wave: WaveId,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct EnemyRoster {
    enemies: Vec<Enemy>,
    next_enemy_id: EnemyId,
    death_linger: Duration,
}

impl EnemyRoster {
    pub(crate) fn new(death_linger: Duration) -> Self {
        Self {
            enemies: Vec::new(),
            next_enemy_id: EnemyId::new(0),
            death_linger,
        }
    }

    pub(crate) fn spawn(
        &mut self,
        kind: EnemyKind,
        stats: &EnemyStats,
        route: &Route,
        wave: WaveId,
        tile_size: f32,
    ) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));

        self.enemies.push(Enemy {
            id,
            kind,
            wave,
            spawn_point: route.spawn_point(),
            route_length: route.length(),
            progress: 0.0,
            position: route.position_at(0.0),
            health: stats.max_health,
            max_health: stats.max_health,
            armor: stats.armor,
            speed: stats.speed * tile_size,
            bounty: stats.bounty,
            leak_damage: stats.leak_damage,
            slow: None,
            aura: stats.aura.map(|aura| Aura {
                interval: aura.interval,
                range: aura.range * tile_size,
                amount: aura.amount,
                elapsed: Duration::ZERO,
            }),
            lifecycle: Lifecycle::Alive,
        });
        id
    }

    /// Moves alive enemies, winds down effects and lingering deaths, and pulses auras.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        routes: &BTreeMap<SpawnPointId, Route>,
        out: &mut Vec<Transition>,
    ) {
        let secs = dt.as_secs_f32();
        let mut pulses: Vec<(Vec2, f32, f32)> = Vec::new();

        for enemy in &mut self.enemies {
            match enemy.lifecycle {
                Lifecycle::Dying { remaining } => {
                    enemy.lifecycle = Lifecycle::Dying {
                        remaining: remaining.saturating_sub(dt),
                    };
                }
                Lifecycle::Alive => {
                    let travelled = enemy.effective_speed() * secs;
                    if travelled.is_finite() && travelled > 0.0 {
                        enemy.progress += travelled;
                    }
                    if let Some(route) = routes.get(&enemy.spawn_point) {
                        enemy.position = route.position_at(enemy.progress);
                    }

                    if let Some(slow) = enemy.slow.as_mut() {
                        slow.remaining = slow.remaining.saturating_sub(dt);
                        if slow.remaining.is_zero() {
                            enemy.slow = None;
                        }
                    }

                    if enemy.has_arrived() {
                        continue;
                    }

                    if let Some(aura) = enemy.aura.as_mut() {
                        let count = aura.accumulate(dt);
                        if count > 0 {
                            pulses.push((enemy.position, aura.range, aura.amount * count as f32));
                        }
                    }
                }
            }
        }

        self.enemies.retain(|enemy| match enemy.lifecycle {
            Lifecycle::Dying { remaining } if remaining.is_zero() => {
                out.push(Transition::Removed { enemy: enemy.id });
                false
            }
            Lifecycle::Alive if enemy.has_arrived() => {
                out.push(Transition::Leaked {
                    enemy: enemy.id,
                    wave: enemy.wave,
                    damage: enemy.leak_damage,
                });
                false
            }
            _ => true,
        });

        for (center, range, amount) in pulses {
            let range_sq = range * range;
            for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
                if enemy.position.distance_squared(center) > range_sq {
                    continue;
                }
                let healed = amount.min(enemy.max_health - enemy.health);
                if healed > 0.0 {
                    enemy.health += healed;
                    out.push(Transition::Healed {
                        enemy: enemy.id,
                        amount: healed,
                    });
                }
            }
        }
    }

    /// Applies projectile damage after armor mitigation.
    pub(crate) fn strike(&mut self, id: EnemyId, damage: f32) -> DamageOutcome {
        let Some(armor) = self.find(id).map(|enemy| enemy.armor) else {
            return DamageOutcome::Ignored;
        };
        self.apply_damage(id, damage * (1.0 - armor))
    }

    /// Reduces health by `amount`, flooring at zero.
    ///
    /// The first application that empties health starts the dying linger and
    /// reports the bounty. Later applications to a dying or missing enemy are
    /// ignored.
    pub(crate) fn apply_damage(&mut self, id: EnemyId, amount: f32) -> DamageOutcome {
        let death_linger = self.death_linger;
        let Some(enemy) = self.find_mut(id) else {
            return DamageOutcome::Ignored;
        };
        if !enemy.is_alive() {
            return DamageOutcome::Ignored;
        }

        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        enemy.health = (enemy.health - amount).max(0.0);

        if enemy.health <= 0.0 {
            enemy.lifecycle = Lifecycle::Dying {
                remaining: death_linger,
            };
            enemy.slow = None;
            DamageOutcome::Killed {
                amount,
                bounty: enemy.bounty,
                wave: enemy.wave,
            }
        } else {
            DamageOutcome::Wounded {
                amount,
                remaining: enemy.health,
            }
        }
    }

    /// Slows an alive enemy. Slows never stack: the stronger factor and the
    /// longer remaining duration win.
    pub(crate) fn apply_slow(&mut self, id: EnemyId, factor: f32, duration: Duration) {
        let Some(enemy) = self.find_mut(id) else {
            return;
        };
        if !enemy.is_alive() || duration.is_zero() {
            return;
        }

        let merged = match enemy.slow {
            Some(existing) => Slow {
                factor: existing.factor.min(factor),
                remaining: existing.remaining.max(duration),
            },
            None => Slow {
                factor,
                remaining: duration,
            },
        };
        enemy.slow = Some(merged);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Position of the enemy if it is still alive.
    pub(crate) fn alive_position(&self, id: EnemyId) -> Option<Vec2> {
        self.find(id)
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| enemy.position)
    }

    pub(crate) fn view(&self) -> EnemyView {
        EnemyView::from_snapshots(self.enemies.iter().map(Enemy::snapshot).collect())
    }

    fn find(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
            .map(|index| &self.enemies[index])
    }

    fn find_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
            .map(|index| &mut self.enemies[index])
    }
}
