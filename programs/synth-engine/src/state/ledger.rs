use std::collections::BTreeMap;

use solana_program::pubkey::Pubkey;

use crate::error::SynthEngineError;

/// Keyed store of non-negative 18-decimal balances with a running total.
///
/// Absent keys read as zero and a key is dropped once its balance returns to
/// zero, so two ledgers with the same balances compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceLedger<K: Ord> {
    balances: BTreeMap<K, u128>,
    total: u128,
}

/// Collateral held in custody, keyed by (user, asset).
pub type CollateralLedger = BalanceLedger<(Pubkey, Pubkey)>;

/// Outstanding synthetic debt, keyed by user.
pub type DebtLedger = BalanceLedger<Pubkey>;

impl<K: Ord + Copy> BalanceLedger<K> {
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            total: 0,
        }
    }

    pub fn get(&self, key: &K) -> u128 {
        self.balances.get(key).copied().unwrap_or(0)
    }

    /// Returns the new balance.
    pub fn increase(&mut self, key: K, amount: u128) -> Result<u128, SynthEngineError> {
        let total = self
            .total
            .checked_add(amount)
            .ok_or(SynthEngineError::ArithmeticOverflow)?;
        let balance = self.balances.entry(key).or_insert(0);
        // Every balance is bounded by the total, so this cannot overflow
        *balance += amount;
        self.total = total;
        Ok(*balance)
    }

    /// Returns the new balance.
    pub fn decrease(&mut self, key: K, amount: u128) -> Result<u128, SynthEngineError> {
        let available = self.get(&key);
        if amount > available {
            return Err(SynthEngineError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let balance = available - amount;
        if balance == 0 {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, balance);
        }
        self.total -= amount;
        Ok(balance)
    }

    pub fn total(&self) -> u128 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &u128)> {
        self.balances.iter()
    }
}

impl<K: Ord + Copy> Default for BalanceLedger<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Both ledgers behind the engine lock.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub collateral: CollateralLedger,
    pub debt: DebtLedger,
}

impl EngineState {
    pub fn collateral_of(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        self.collateral.get(&(*user, *asset))
    }

    pub fn debt_of(&self, user: &Pubkey) -> u128 {
        self.debt.get(user)
    }

    /// Custody total of one asset across all users.
    pub fn total_collateral(&self, asset: &Pubkey) -> u128 {
        self.collateral
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }
}
