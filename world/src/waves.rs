//! Bookkeeping that decides when a wave is cleared and its reward is due.

use std::collections::BTreeMap;

use home_defence_core::WaveId;

#[derive(Clone, Copy, Debug, Default)]
struct WaveTally {
    live: u32,
    closed: bool,
    cleared: bool,
    reward: u32,
}

impl WaveTally {
    fn settle(&mut self) -> Option<u32> {
        if self.cleared || !self.closed || self.live > 0 {
            return None;
        }
        self.cleared = true;
        Some(self.reward)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct WaveLedger {
    tallies: BTreeMap<WaveId, WaveTally>,
    finished: bool,
}

impl WaveLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_spawn(&mut self, wave: WaveId) {
        let tally = self.tallies.entry(wave).or_default();
        tally.live = tally.live.saturating_add(1);
    }

    /// Records that an enemy of the wave was killed or leaked.
    ///
    /// Returns the reward when this departure clears the wave.
    pub(crate) fn record_departure(&mut self, wave: WaveId) -> Option<u32> {
        let tally = self.tallies.get_mut(&wave)?;
        tally.live = tally.live.saturating_sub(1);
        tally.settle()
    }

    /// Marks the wave as fully spawned. Returns the reward if nothing of it is left alive.
    pub(crate) fn close(&mut self, wave: WaveId, reward: u32) -> Option<u32> {
        let tally = self.tallies.entry(wave).or_default();
        if tally.closed {
            return None;
        }
        tally.closed = true;
        tally.reward = reward;
        tally.settle()
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    pub(crate) fn cleared_count(&self) -> usize {
        self.tallies.values().filter(|tally| tally.cleared).count()
    }

    /// Every wave was scheduled, closed and cleared.
    pub(crate) fn all_resolved(&self) -> bool {
        self.finished && self.tallies.values().all(|tally| tally.cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_clears_after_close_and_last_departure() {
        let mut ledger = WaveLedger::new();
        let wave = WaveId::new(0);
        ledger.record_spawn(wave);
        ledger.record_spawn(wave);

        assert_eq!(ledger.record_departure(wave), None);
        assert_eq!(ledger.close(wave, 40), None);
        assert_eq!(ledger.record_departure(wave), Some(40));
        assert_eq!(ledger.record_departure(wave), None, "reward paid once");
        assert_eq!(ledger.cleared_count(), 1);
    }

    #[test]
    fn empty_wave_clears_when_closed() {
        let mut ledger = WaveLedger::new();
        assert_eq!(ledger.close(WaveId::new(2), 15), Some(15));
        assert_eq!(ledger.close(WaveId::new(2), 15), None);
    }

    #[test]
    fn resolution_requires_finish() {
        let mut ledger = WaveLedger::new();
        let _ = ledger.close(WaveId::new(0), 0);
        assert!(!ledger.all_resolved());
        ledger.finish();
        assert!(ledger.all_resolved());

        ledger.record_spawn(WaveId::new(1));
        assert!(!ledger.all_resolved());
    }
}
