#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-driven wave scheduler that turns a wave plan into spawn commands.
//!
//! The scheduler walks a fixed state machine,
//! `Idle → InterWaveDelay → WaveActive → InterWaveDelay → … → AllWavesComplete`,
//! consuming exactly the elapsed time it is handed. A single large step emits
//! every spawn it spans, in schedule order.

use std::time::Duration;

use home_defence_core::{Command, WaveDefinition, WaveId, WavePlan};
use tracing::debug;

/// Stage of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// Nothing was scheduled yet.
    Idle,
    /// Counting down the lead time of the next wave.
    InterWaveDelay {
        /// Wave that starts once the countdown elapses.
        next: WaveId,
        /// Time left in the countdown.
        remaining: Duration,
    },
    /// Emitting the spawns of a wave.
    WaveActive {
        /// Wave being spawned.
        wave: WaveId,
        /// Index of the next spawn entry within the wave.
        next_entry: usize,
        /// Time waited since the previous spawn of the wave.
        waited: Duration,
    },
    /// Every wave was spawned; further advances do nothing.
    AllWavesComplete,
}

/// Pure system that emits `SpawnEnemy`, `CloseWave` and `FinishWaves` commands.
#[derive(Clone, Debug)]
pub struct WaveScheduler {
    waves: Vec<WaveDefinition>,
    phase: WavePhase,
}

impl WaveScheduler {
    /// Creates a scheduler sitting idle before the first wave of `plan`.
    #[must_use]
    pub fn new(plan: WavePlan) -> Self {
        Self {
            waves: plan.waves,
            phase: WavePhase::Idle,
        }
    }

    /// Current stage of the state machine.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Number of waves in the plan.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }

    /// Number of waves that began spawning.
    #[must_use]
    pub fn waves_started(&self) -> u32 {
        match self.phase {
            WavePhase::Idle => 0,
            WavePhase::InterWaveDelay { next, .. } => next.get(),
            WavePhase::WaveActive { wave, .. } => wave.get().saturating_add(1),
            WavePhase::AllWavesComplete => self.wave_count(),
        }
    }

    /// Reports whether every wave was spawned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == WavePhase::AllWavesComplete
    }

    /// Consumes `dt` and appends every command that fell due, in order.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let mut budget = dt;

        loop {
            match self.phase {
                WavePhase::Idle => self.count_down_to(0, out),
                WavePhase::InterWaveDelay { next, remaining } => {
                    if budget < remaining {
                        self.phase = WavePhase::InterWaveDelay {
                            next,
                            remaining: remaining - budget,
                        };
                        return;
                    }
                    budget -= remaining;
                    debug!(wave = next.get(), "wave started");
                    self.phase = WavePhase::WaveActive {
                        wave: next,
                        next_entry: 0,
                        waited: Duration::ZERO,
                    };
                }
                WavePhase::WaveActive {
                    wave,
                    next_entry,
                    waited,
                } => {
                    let Some(definition) = self.wave(wave) else {
                        self.phase = WavePhase::AllWavesComplete;
                        out.push(Command::FinishWaves);
                        return;
                    };

                    let reward = definition.reward;
                    match definition.spawns.get(next_entry).copied() {
                        Some(entry) => {
                            let due = entry.delay.saturating_sub(waited);
                            if budget < due {
                                self.phase = WavePhase::WaveActive {
                                    wave,
                                    next_entry,
                                    waited: waited + budget,
                                };
                                return;
                            }
                            budget -= due;
                            out.push(Command::SpawnEnemy {
                                kind: entry.kind,
                                spawn_point: entry.spawn_point,
                                wave,
                            });
                            self.phase = WavePhase::WaveActive {
                                wave,
                                next_entry: next_entry + 1,
                                waited: Duration::ZERO,
                            };
                        }
                        None => {
                            out.push(Command::CloseWave { wave, reward });
                            let following = usize::try_from(wave.get())
                                .map_or(usize::MAX, |index| index.saturating_add(1));
                            self.count_down_to(following, out);
                        }
                    }
                }
                WavePhase::AllWavesComplete => return,
            }
        }
    }

    fn wave(&self, wave: WaveId) -> Option<&WaveDefinition> {
        usize::try_from(wave.get())
            .ok()
            .and_then(|index| self.waves.get(index))
    }

    fn count_down_to(&mut self, index: usize, out: &mut Vec<Command>) {
        match self.waves.get(index) {
            Some(definition) => {
                self.phase = WavePhase::InterWaveDelay {
                    next: WaveId::new(u32::try_from(index).unwrap_or(u32::MAX)),
                    remaining: definition.lead_time,
                };
            }
            None => {
                debug!("all waves scheduled");
                self.phase = WavePhase::AllWavesComplete;
                out.push(Command::FinishWaves);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use home_defence_core::{EnemyKind, SpawnEntry, SpawnPointId};

    fn entry(kind: EnemyKind, delay_ms: u64) -> SpawnEntry {
        SpawnEntry {
            kind,
            spawn_point: SpawnPointId::new(0),
            delay: Duration::from_millis(delay_ms),
        }
    }

    fn spawned(commands: &[Command]) -> Vec<(EnemyKind, u32)> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEnemy { kind, wave, .. } => Some((*kind, wave.get())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_large_step_emits_every_spanned_spawn_in_order() {
        let plan = WavePlan::new(vec![WaveDefinition {
            lead_time: Duration::ZERO,
            reward: 5,
            spawns: vec![
                entry(EnemyKind::Slime, 0),
                entry(EnemyKind::Goblin, 1_000),
                entry(EnemyKind::Skeleton, 1_000),
            ],
        }]);
        let mut scheduler = WaveScheduler::new(plan);
        let mut commands = Vec::new();

        scheduler.advance(Duration::from_millis(2_500), &mut commands);

        assert_eq!(
            spawned(&commands),
            vec![
                (EnemyKind::Slime, 0),
                (EnemyKind::Goblin, 0),
                (EnemyKind::Skeleton, 0),
            ]
        );
        assert_eq!(
            commands[3..],
            [
                Command::CloseWave {
                    wave: WaveId::new(0),
                    reward: 5,
                },
                Command::FinishWaves,
            ]
        );
        assert!(scheduler.is_complete());
    }

    #[test]
    fn spawns_wait_for_their_delay_across_steps() {
        let plan = WavePlan::new(vec![WaveDefinition {
            lead_time: Duration::from_secs(1),
            reward: 0,
            spawns: vec![entry(EnemyKind::Slime, 500), entry(EnemyKind::Slime, 500)],
        }]);
        let mut scheduler = WaveScheduler::new(plan);
        let mut commands = Vec::new();

        scheduler.advance(Duration::from_millis(1_400), &mut commands);
        assert!(commands.is_empty());
        assert_eq!(
            scheduler.phase(),
            WavePhase::WaveActive {
                wave: WaveId::new(0),
                next_entry: 0,
                waited: Duration::from_millis(400),
            }
        );

        scheduler.advance(Duration::from_millis(100), &mut commands);
        assert_eq!(spawned(&commands).len(), 1);
        scheduler.advance(Duration::from_millis(499), &mut commands);
        assert_eq!(spawned(&commands).len(), 1);
        scheduler.advance(Duration::from_millis(1), &mut commands);
        assert_eq!(spawned(&commands).len(), 2);
    }

    #[test]
    fn empty_wave_closes_immediately() {
        let plan = WavePlan::new(vec![
            WaveDefinition {
                lead_time: Duration::ZERO,
                reward: 7,
                spawns: Vec::new(),
            },
            WaveDefinition {
                lead_time: Duration::from_secs(3),
                reward: 0,
                spawns: vec![entry(EnemyKind::Goblin, 0)],
            },
        ]);
        let mut scheduler = WaveScheduler::new(plan);
        let mut commands = Vec::new();

        scheduler.advance(Duration::ZERO, &mut commands);

        assert_eq!(
            commands,
            vec![Command::CloseWave {
                wave: WaveId::new(0),
                reward: 7,
            }]
        );
        assert_eq!(
            scheduler.phase(),
            WavePhase::InterWaveDelay {
                next: WaveId::new(1),
                remaining: Duration::from_secs(3),
            }
        );
        assert_eq!(scheduler.waves_started(), 1);
    }

    #[test]
    fn advancing_after_completion_is_a_no_op() {
        let mut scheduler = WaveScheduler::new(WavePlan::default());
        let mut commands = Vec::new();

        scheduler.advance(Duration::from_secs(1), &mut commands);
        assert_eq!(commands, vec![Command::FinishWaves]);

        commands.clear();
        scheduler.advance(Duration::from_secs(60), &mut commands);
        assert!(commands.is_empty());
        assert_eq!(scheduler.phase(), WavePhase::AllWavesComplete);
    }

    #[test]
    fn waves_spawn_on_schedule_one_after_another() {
        let wave = |lead_ms| WaveDefinition {
            lead_time: Duration::from_millis(lead_ms),
            reward: 1,
            spawns: vec![entry(EnemyKind::Slime, 0)],
        };
        let mut scheduler = WaveScheduler::new(WavePlan::new(vec![wave(0), wave(2_000)]));
        let mut commands = Vec::new();

        scheduler.advance(Duration::from_millis(1_999), &mut commands);
        assert_eq!(spawned(&commands), vec![(EnemyKind::Slime, 0)]);
        assert_eq!(scheduler.waves_started(), 1);

        scheduler.advance(Duration::from_millis(1), &mut commands);
        assert_eq!(
            spawned(&commands),
            vec![(EnemyKind::Slime, 0), (EnemyKind::Slime, 1)]
        );
        assert_eq!(scheduler.waves_started(), 2);
        assert!(scheduler.is_complete());
    }
}
