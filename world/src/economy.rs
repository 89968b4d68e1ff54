//! Player health and currency, and the end-of-game determination.

use home_defence_core::{CommandError, GameOutcome};

#[derive(Clone, Debug)]
pub(crate) struct Economy {
    health: u32,
    currency: u32,
    outcome: Option<GameOutcome>,
}

impl Economy {
    pub(crate) fn new(health: u32, currency: u32) -> Self {
        Self {
            health,
            currency,
            outcome: None,
        }
    }

    pub(crate) fn health(&self) -> u32 {
        self.health
    }

    pub(crate) fn currency(&self) -> u32 {
        self.currency
    }

    pub(crate) fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Subtracts leak damage, clamping at zero, and returns the remaining health.
    pub(crate) fn suffer_leak(&mut self, damage: u32) -> u32 {
        self.health = self.health.saturating_sub(damage);
        self.health
    }

    /// Credits currency and returns the new balance.
    pub(crate) fn earn(&mut self, amount: u32) -> u32 {
        self.currency = self.currency.saturating_add(amount);
        self.currency
    }

    /// Debits currency, refusing spends that would go negative.
    pub(crate) fn spend(&mut self, cost: u32) -> Result<u32, CommandError> {
        let remaining = self
            .currency
            .checked_sub(cost)
            .ok_or(CommandError::InsufficientFunds {
                required: cost,
                available: self.currency,
            })?;
        self.currency = remaining;
        Ok(remaining)
    }

    /// Settles the outcome once. Returns it only on the call that settled it.
    ///
    /// Defeat takes precedence: a leak that empties home health in the same
    /// tick the last wave clears still loses the game.
    pub(crate) fn conclude(&mut self, waves_resolved: bool) -> Option<GameOutcome> {
        if self.outcome.is_some() {
            return None;
        }

        let outcome = if self.health == 0 {
            GameOutcome::Defeat
        } else if waves_resolved {
            GameOutcome::Victory
        } else {
            return None;
        };
        self.outcome = Some(outcome);
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaks_clamp_health_at_zero() {
        let mut economy = Economy::new(20, 100);
        assert_eq!(economy.suffer_leak(5), 15);
        assert_eq!(economy.conclude(false), None);
        assert_eq!(economy.suffer_leak(50), 0);
        assert_eq!(economy.conclude(false), Some(GameOutcome::Defeat));
    }

    #[test]
    fn rejected_spend_leaves_balance_untouched() {
        let mut economy = Economy::new(1, 30);
        assert_eq!(
            economy.spend(31),
            Err(CommandError::InsufficientFunds {
                required: 31,
                available: 30,
            })
        );
        assert_eq!(economy.currency(), 30);
        assert_eq!(economy.spend(30), Ok(0));
    }

    #[test]
    fn outcome_is_reported_once() {
        let mut economy = Economy::new(3, 0);
        assert_eq!(economy.conclude(true), Some(GameOutcome::Victory));
        assert_eq!(economy.conclude(true), None);
        let _ = economy.suffer_leak(3);
        assert_eq!(economy.conclude(true), None);
        assert_eq!(economy.outcome(), Some(GameOutcome::Victory));
    }
}
