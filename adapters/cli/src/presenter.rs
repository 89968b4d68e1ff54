//! Presenter that turns cues into log lines.

use std::time::Duration;

use home_defence_simulation::{Notification, Presenter};
use tracing::{debug, info};

/// Logs every cue and holds a fixed-length closing banner.
#[derive(Debug)]
pub(crate) struct LogPresenter {
    banner: Duration,
    shown: Duration,
}

impl LogPresenter {
    pub(crate) fn new(banner: Duration) -> Self {
        Self {
            banner,
            shown: Duration::ZERO,
        }
    }
}

impl Presenter for LogPresenter {
    fn notify(&mut self, notification: Notification) {
        match notification {
            Notification::EnemyLeaked { enemy, damage } => {
                info!(?enemy, damage, "enemy reached home");
            }
            Notification::EnemyKilled { enemy, bounty } => {
                debug!(?enemy, bounty, "enemy killed");
            }
            Notification::TowerFired { tower, kind } => debug!(?tower, ?kind, "tower fired"),
            Notification::ProjectileImpact { kind, enemy } => {
                debug!(?kind, ?enemy, "projectile struck");
            }
            Notification::WaveCleared { wave, reward } => info!(?wave, reward, "wave cleared"),
            Notification::GameOver { outcome } => info!(?outcome, "game over"),
        }
    }

    fn advance_ending(&mut self, dt: Duration) -> bool {
        self.shown = self.shown.saturating_add(dt);
        self.shown >= self.banner
    }
}
