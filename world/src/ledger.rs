//! Gold and lives bookkeeping.

use path_defence_core::SessionRules;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ledger {
    gold: u32,
    lives: i32,
}

impl Ledger {
    pub(crate) fn new(rules: &SessionRules) -> Self {
        Self {
            gold: rules.starting_gold,
            lives: rules.starting_lives,
        }
    }

    pub(crate) fn gold(&self) -> u32 {
        self.gold
    }

    pub(crate) fn lives(&self) -> i32 {
        self.lives
    }

    /// Deducts `cost`, or reports the current balance when it falls short.
    pub(crate) fn spend(&mut self, cost: u32) -> Result<(), u32> {
        if self.gold < cost {
            return Err(self.gold);
        }
        self.gold -= cost;
        Ok(())
    }

    pub(crate) fn earn(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    pub(crate) fn lose_lives(&mut self, count: usize) {
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        self.lives = self.lives.saturating_sub(count);
    }

    pub(crate) fn is_depleted(&self) -> bool {
        self.lives <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spending_never_overdraws() {
        let mut ledger = Ledger::new(&SessionRules::default());

        assert_eq!(ledger.spend(25), Ok(()));
        assert_eq!(ledger.gold(), 75);
        assert_eq!(ledger.spend(90), Err(75));
        assert_eq!(ledger.gold(), 75);

        ledger.earn(5);
        assert_eq!(ledger.gold(), 80);
    }

    #[test]
    fn lives_may_drop_below_zero() {
        let mut ledger = Ledger::new(&SessionRules {
            starting_lives: 2,
            ..SessionRules::default()
        });

        ledger.lose_lives(3);

        assert_eq!(ledger.lives(), -1);
        assert!(ledger.is_depleted());
    }
}
