//! Notifications consumed by audio and banner collaborators.

use std::time::Duration;

use home_defence_core::{EnemyId, Event, GameOutcome, ProjectileKind, TowerId, WaveId};

/// Cue raised by the simulation at the transition that triggered it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Notification {
    /// An enemy reached home.
    EnemyLeaked {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Health the player lost.
        damage: u32,
    },
    /// An enemy was killed.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Currency awarded.
        bounty: u32,
    },
    /// A tower launched a projectile.
    TowerFired {
        /// Tower that fired.
        tower: TowerId,
        /// Projectile it launched.
        kind: ProjectileKind,
    },
    /// A projectile struck an enemy.
    ProjectileImpact {
        /// Projectile kind that struck.
        kind: ProjectileKind,
        /// Enemy struck.
        enemy: EnemyId,
    },
    /// Every enemy of a wave is gone and the reward was paid.
    WaveCleared {
        /// Wave that was cleared.
        wave: WaveId,
        /// Currency credited.
        reward: u32,
    },
    /// The game ended. Raised once.
    GameOver {
        /// Final result.
        outcome: GameOutcome,
    },
}

impl Notification {
    /// Maps a world event onto the cue it raises, if any.
    #[must_use]
    pub fn from_event(event: &Event) -> Option<Self> {
        let notification = match *event {
            Event::EnemyLeaked { enemy, damage } => Self::EnemyLeaked { enemy, damage },
            Event::EnemyKilled { enemy, bounty } => Self::EnemyKilled { enemy, bounty },
            Event::ProjectileFired { tower, kind, .. } => Self::TowerFired { tower, kind },
            Event::ProjectileHit { kind, enemy, .. } => Self::ProjectileImpact { kind, enemy },
            Event::WaveCleared { wave, reward } => Self::WaveCleared { wave, reward },
            Event::GameOver { outcome } => Self::GameOver { outcome },
            _ => return None,
        };
        Some(notification)
    }
}

/// Collaborator that plays cues and runs the end-of-game banner.
pub trait Presenter {
    /// Receives a cue.
    fn notify(&mut self, notification: Notification);

    /// Advances the end-of-game banner, returning `true` once it finished.
    ///
    /// Called every frame after the game is over. The default finishes
    /// immediately.
    fn advance_ending(&mut self, dt: Duration) -> bool {
        let _ = dt;
        true
    }
}

/// Records every cue and finishes the ending at once.
impl Presenter for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}
