//! Read-only frame state handed to render collaborators.

use std::time::Duration;

use home_defence_core::{
    EnemySnapshot, EnemyStatus, GameOutcome, ProjectilePhase, ProjectileSnapshot, TowerSnapshot,
    Vec2,
};
use sha2::{Digest, Sha256};

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Simulated time since the start of the game.
    pub elapsed: Duration,
    /// Enemies in identifier order, dying ones included.
    pub enemies: Vec<EnemySnapshot>,
    /// Towers in identifier order.
    pub towers: Vec<TowerSnapshot>,
    /// Projectiles in identifier order, including those resolved this frame.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Remaining home health.
    pub health: u32,
    /// Currency held by the player.
    pub currency: u32,
    /// Progress through the wave plan.
    pub waves: WaveProgress,
    /// Final result once the game is over.
    pub outcome: Option<GameOutcome>,
}

/// Progress through the wave plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveProgress {
    /// Waves that began spawning.
    pub started: u32,
    /// Waves whose reward was paid.
    pub cleared: u32,
    /// Waves in the plan.
    pub total: u32,
}

impl Snapshot {
    /// SHA-256 digest of a canonical little-endian encoding of the snapshot.
    ///
    /// Two runs fed identical inputs produce identical digests.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.elapsed.as_nanos().to_le_bytes());
        hasher.update(self.health.to_le_bytes());
        hasher.update(self.currency.to_le_bytes());
        hasher.update(self.waves.started.to_le_bytes());
        hasher.update(self.waves.cleared.to_le_bytes());
        hasher.update(self.waves.total.to_le_bytes());
        hasher.update([match self.outcome {
            None => 0u8,
            Some(GameOutcome::Victory) => 1,
            Some(GameOutcome::Defeat) => 2,
        }]);

        hasher.update((self.enemies.len() as u64).to_le_bytes());
        for enemy in &self.enemies {
            hasher.update(enemy.id.get().to_le_bytes());
            hasher.update([enemy.kind as u8]);
            hasher.update(enemy.wave.get().to_le_bytes());
            update_vec2(&mut hasher, enemy.position);
            hasher.update(enemy.progress.to_bits().to_le_bytes());
            hasher.update(enemy.health.to_bits().to_le_bytes());
            hasher.update([
                match enemy.status {
                    EnemyStatus::Alive => 0u8,
                    EnemyStatus::Dying => 1,
                },
                u8::from(enemy.slowed),
            ]);
        }

        hasher.update((self.towers.len() as u64).to_le_bytes());
        for tower in &self.towers {
            hasher.update(tower.id.get().to_le_bytes());
            hasher.update([tower.kind as u8]);
            hasher.update(tower.tile.column().to_le_bytes());
            hasher.update(tower.tile.row().to_le_bytes());
            hasher.update(tower.level.to_le_bytes());
            hasher.update(tower.cooldown.as_nanos().to_le_bytes());
            hasher.update(tower.target.map_or(u32::MAX, |target| target.get()).to_le_bytes());
            update_vec2(&mut hasher, tower.facing);
        }

        hasher.update((self.projectiles.len() as u64).to_le_bytes());
        for projectile in &self.projectiles {
            hasher.update(projectile.id.get().to_le_bytes());
            hasher.update([
                projectile.kind as u8,
                match projectile.phase {
                    ProjectilePhase::Traveling => 0,
                    ProjectilePhase::Hit => 1,
                    ProjectilePhase::Expired => 2,
                },
            ]);
            hasher.update(projectile.tower.get().to_le_bytes());
            update_vec2(&mut hasher, projectile.position);
        }

        hasher.finalize().into()
    }
}

fn update_vec2(hasher: &mut Sha256, value: Vec2) {
    hasher.update(value.x.to_bits().to_le_bytes());
    hasher.update(value.y.to_bits().to_le_bytes());
}
