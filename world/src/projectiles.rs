//! Projectile flight and collision resolution.

use std::time::Duration;

use home_defence_core::{
    EnemyId, EnemyView, GameConfig, ImpactEffect, ProjectileId, ProjectileKind, ProjectilePhase,
    ProjectileSnapshot, TowerId, TravelPolicy, Vec2,
};

#[derive(Clone, Debug)]
struct Projectile {
    id: ProjectileId,
    kind: ProjectileKind,
    tower: TowerId,
    /// Homing projectiles chase this enemy; ballistic ones only record it.
    target: EnemyId,
    position: Vec2,
    /// Unit travel vector fixed at launch.
    heading: Vec2,
    travelled: f32,
    damage: f32,
    phase: ProjectilePhase,
}

/// Parameters of a projectile about to leave a tower.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) kind: ProjectileKind,
    pub(crate) tower: TowerId,
    pub(crate) target: EnemyId,
    pub(crate) origin: Vec2,
    /// Target position at the moment of firing.
    pub(crate) aim: Vec2,
    pub(crate) damage: f32,
}

/// How a projectile resolved during an advance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Resolution {
    Hit {
        projectile: ProjectileId,
        kind: ProjectileKind,
        enemy: EnemyId,
        impact: Vec2,
        damage: f32,
        effect: ImpactEffect,
    },
    Expired {
        projectile: ProjectileId,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct ProjectileRegistry {
    projectiles: Vec<Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileRegistry {
    pub(crate) fn new() -> Self {
        Self {
            projectiles: Vec::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(&mut self, launch: Launch) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));

        let heading = (launch.aim - launch.origin)
            .try_normalize()
            .unwrap_or(Vec2::X);
        self.projectiles.push(Projectile {
            id,
            kind: launch.kind,
            tower: launch.tower,
            target: launch.target,
            position: launch.origin,
            heading,
            travelled: 0.0,
            damage: launch.damage,
            phase: ProjectilePhase::Traveling,
        });
        id
    }

    /// Drops projectiles that resolved during the previous advance, then
    /// moves the remaining ones and reports how each of them resolved.
    ///
    /// Collisions are decided against `enemies` as captured before any of
    /// this advance's damage is applied. Resolutions are reported in
    /// ascending projectile order.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        enemies: &EnemyView,
        config: &GameConfig,
        bounds: Vec2,
        out: &mut Vec<Resolution>,
    ) {
        self.projectiles
            .retain(|projectile| projectile.phase == ProjectilePhase::Traveling);

        let secs = dt.as_secs_f32();
        let tile_size = config.tile_size;

        for projectile in &mut self.projectiles {
            let Some(stats) = config.projectile(projectile.kind) else {
                projectile.phase = ProjectilePhase::Expired;
                out.push(Resolution::Expired {
                    projectile: projectile.id,
                });
                continue;
            };

            let step = stats.speed * tile_size * secs;
            let hit_radius = stats.hit_radius * tile_size;
            let max_range = stats.max_range * tile_size;

            let struck = match stats.travel {
                TravelPolicy::Homing => fly_homing(projectile, enemies, step, hit_radius),
                TravelPolicy::Ballistic => fly_ballistic(projectile, enemies, step, hit_radius),
            };

            match struck {
                Flight::Struck(enemy) => {
                    projectile.phase = ProjectilePhase::Hit;
                    out.push(Resolution::Hit {
                        projectile: projectile.id,
                        kind: projectile.kind,
                        enemy,
                        impact: projectile.position,
                        damage: projectile.damage,
                        effect: stats.effect,
                    });
                }
                Flight::Lost => {
                    projectile.phase = ProjectilePhase::Expired;
                    out.push(Resolution::Expired {
                        projectile: projectile.id,
                    });
                }
                Flight::Travelling => {
                    let outside = projectile.position.x < 0.0
                        || projectile.position.y < 0.0
                        || projectile.position.x > bounds.x
                        || projectile.position.y > bounds.y;
                    if projectile.travelled >= max_range || outside {
                        projectile.phase = ProjectilePhase::Expired;
                        out.push(Resolution::Expired {
                            projectile: projectile.id,
                        });
                    }
                }
            }
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                kind: projectile.kind,
                tower: projectile.tower,
                position: projectile.position,
                target: Some(projectile.target),
                phase: projectile.phase,
            })
            .collect()
    }
}

enum Flight {
    Travelling,
    Struck(EnemyId),
    /// The homing target vanished mid-flight.
    Lost,
}

fn fly_homing(
    projectile: &mut Projectile,
    enemies: &EnemyView,
    step: f32,
    hit_radius: f32,
) -> Flight {
    let Some(target) = enemies.alive(projectile.target) else {
        return Flight::Lost;
    };

    let offset = target.position - projectile.position;
    let distance = offset.length();
    if distance - step <= hit_radius {
        projectile.position = target.position;
        projectile.travelled += distance.min(step);
        return Flight::Struck(target.id);
    }

    projectile.position += offset / distance * step;
    projectile.travelled += step;
    if let Some(heading) = offset.try_normalize() {
        projectile.heading = heading;
    }
    Flight::Travelling
}

fn fly_ballistic(
    projectile: &mut Projectile,
    enemies: &EnemyView,
    step: f32,
    hit_radius: f32,
) -> Flight {
    let start = projectile.position;
    let end = start + projectile.heading * step;

    let first = enemies
        .iter()
        .filter(|enemy| enemy.is_alive())
        .filter_map(|enemy| {
            segment_entry(start, end, enemy.position, hit_radius).map(|entry| (entry, enemy.id))
        })
        .min_by(|(left_entry, left_id), (right_entry, right_id)| {
            left_entry
                .total_cmp(right_entry)
                .then(left_id.cmp(right_id))
        });

    if let Some((entry, enemy)) = first {
        projectile.position = start.lerp(end, entry);
        projectile.travelled += step * entry;
        return Flight::Struck(enemy);
    }

    projectile.position = end;
    projectile.travelled += step;
    Flight::Travelling
}

/// Fraction of the segment `start..end` at which it first enters the circle,
/// or `None` when it never does.
fn segment_entry(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let from_center = start - center;
    let c = from_center.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let delta = end - start;
    let a = delta.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * from_center.dot(delta);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let entry = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&entry).then_some(entry)
}
