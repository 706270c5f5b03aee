use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::SynthEngineError,
    events::EngineEvent,
    state::EngineState,
    token::Capabilities,
};

/// A ledger mutation applied during an operation. Kept so it can be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    CollateralIncreased { user: Pubkey, asset: Pubkey, amount: u128 },
    CollateralDecreased { user: Pubkey, asset: Pubkey, amount: u128 },
    DebtIncreased { user: Pubkey, amount: u128 },
    DebtDecreased { user: Pubkey, amount: u128 },
}

impl LedgerChange {
    fn apply(&self, state: &mut EngineState) -> Result<(), SynthEngineError> {
        match *self {
            LedgerChange::CollateralIncreased { user, asset, amount } => {
                state.collateral.increase((user, asset), amount)?;
            }
            LedgerChange::CollateralDecreased { user, asset, amount } => {
                state.collateral.decrease((user, asset), amount)?;
            }
            LedgerChange::DebtIncreased { user, amount } => {
                state.debt.increase(user, amount)?;
            }
            LedgerChange::DebtDecreased { user, amount } => {
                state.debt.decrease(user, amount)?;
            }
        }
        Ok(())
    }

    fn inverse(&self) -> Self {
        match *self {
            LedgerChange::CollateralIncreased { user, asset, amount } => {
                LedgerChange::CollateralDecreased { user, asset, amount }
            }
            LedgerChange::CollateralDecreased { user, asset, amount } => {
                LedgerChange::CollateralIncreased { user, asset, amount }
            }
            LedgerChange::DebtIncreased { user, amount } => LedgerChange::DebtDecreased { user, amount },
            LedgerChange::DebtDecreased { user, amount } => LedgerChange::DebtIncreased { user, amount },
        }
    }
}

/// A call into an external capability, queued until every check has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    PullCollateral { asset: Pubkey, owner: Pubkey, amount: u128 },
    PushCollateral { asset: Pubkey, to: Pubkey, amount: u128 },
    PullDebt { owner: Pubkey, amount: u128 },
    PushDebt { to: Pubkey, amount: u128 },
    MintDebt { to: Pubkey, amount: u128 },
    BurnDebt { amount: u128 },
}

impl Interaction {
    /// Inbound calls move value into the engine and run before any outbound call.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            Interaction::PullCollateral { .. } | Interaction::PullDebt { .. } | Interaction::BurnDebt { .. }
        )
    }

    fn execute(&self, caps: &Capabilities) -> Result<(), SynthEngineError> {
        let custody = &caps.custody;
        match *self {
            Interaction::PullCollateral { asset, owner, amount } => caps
                .collateral_token(&asset)?
                .pull(&owner, custody, amount)
                .map_err(SynthEngineError::TransferFailed),
            Interaction::PushCollateral { asset, to, amount } => caps
                .collateral_token(&asset)?
                .push(custody, &to, amount)
                .map_err(SynthEngineError::TransferFailed),
            Interaction::PullDebt { owner, amount } => caps
                .debt_token
                .pull(&owner, custody, amount)
                .map_err(SynthEngineError::TransferFailed),
            Interaction::PushDebt { to, amount } => caps
                .debt_token
                .push(custody, &to, amount)
                .map_err(SynthEngineError::TransferFailed),
            Interaction::MintDebt { to, amount } => caps
                .debt_token
                .mint_to(&to, amount)
                .map_err(SynthEngineError::MintFailed),
            Interaction::BurnDebt { amount } => caps
                .debt_token
                .burn(custody, amount)
                .map_err(SynthEngineError::BurnFailed),
        }
    }

    /// The call that undoes this one after it succeeded.
    fn compensation(&self, custody: Pubkey) -> Option<Interaction> {
        match *self {
            Interaction::PullCollateral { asset, owner, amount } => {
                Some(Interaction::PushCollateral { asset, to: owner, amount })
            }
            Interaction::PushCollateral { asset, to, amount } => {
                Some(Interaction::PullCollateral { asset, owner: to, amount })
            }
            Interaction::PullDebt { owner, amount } => Some(Interaction::PushDebt { to: owner, amount }),
            Interaction::PushDebt { to, amount } => Some(Interaction::PullDebt { owner: to, amount }),
            Interaction::BurnDebt { amount } => Some(Interaction::MintDebt { to: custody, amount }),
            // Outbound mints run last; nothing after them can fail
            Interaction::MintDebt { .. } => None,
        }
    }
}

/// A queued interaction and the journaled ledger change it backs, if any.
#[derive(Debug, Clone, Copy)]
struct Queued {
    interaction: Interaction,
    settles: Option<usize>,
}

/// Staged effects of one operation.
///
/// Ledger changes are applied to the live state immediately and journaled;
/// events and capability calls are held back until the operation commits.
#[derive(Debug, Default)]
pub struct Stage {
    changes: Vec<LedgerChange>,
    interactions: Vec<Queued>,
    events: Vec<EngineEvent>,
    /// Journal indices that must survive a rollback because their interaction
    /// ran and could not be undone.
    stranded: Vec<usize>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `change` to `state` and record it. A failed change leaves both untouched.
    pub fn apply(&mut self, state: &mut EngineState, change: LedgerChange) -> Result<(), SynthEngineError> {
        change.apply(state)?;
        self.changes.push(change);
        Ok(())
    }

    /// Queue an interaction with no ledger change of its own.
    pub fn queue(&mut self, interaction: Interaction) {
        self.interactions.push(Queued {
            interaction,
            settles: None,
        });
    }

    /// Queue an interaction that moves the funds behind the most recently
    /// applied ledger change.
    pub fn settle(&mut self, interaction: Interaction) {
        self.interactions.push(Queued {
            interaction,
            settles: self.changes.len().checked_sub(1),
        });
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    /// Run queued interactions, inbound first, preserving queue order within each
    /// group. On the first failure every interaction that already ran is
    /// compensated in reverse order.
    ///
    /// Returns the failure unchanged when every compensation succeeded, and
    /// `CompensationFailed` wrapping it when some funds could not be returned.
    pub fn execute(&mut self, caps: &Capabilities) -> Result<(), SynthEngineError> {
        let ordered: Vec<Queued> = self
            .interactions
            .iter()
            .filter(|q| q.interaction.is_inbound())
            .chain(self.interactions.iter().filter(|q| !q.interaction.is_inbound()))
            .copied()
            .collect();

        let mut done: Vec<Queued> = Vec::with_capacity(ordered.len());
        for queued in ordered {
            if let Err(err) = queued.interaction.execute(caps) {
                msg!("Interaction {:?} failed: {}", queued.interaction, err);
                let stranded = Self::compensate(&done, caps);
                if stranded.is_empty() {
                    return Err(err);
                }

                self.stranded = stranded.iter().filter_map(|q| q.settles).collect();
                return Err(SynthEngineError::CompensationFailed {
                    original: Box::new(err),
                    stranded: stranded.len(),
                });
            }
            done.push(queued);
        }
        Ok(())
    }

    /// Undo `done` newest first. Returns the interactions whose effect is still
    /// in place.
    fn compensate(done: &[Queued], caps: &Capabilities) -> Vec<Queued> {
        let mut stranded = Vec::new();
        for queued in done.iter().rev() {
            match queued.interaction.compensation(caps.custody) {
                Some(undo) => {
                    if let Err(err) = undo.execute(caps) {
                        msg!("Compensation {:?} failed: {}", undo, err);
                        stranded.push(*queued);
                    }
                }
                None => {
                    msg!("No compensation for {:?}", queued.interaction);
                    stranded.push(*queued);
                }
            }
        }
        stranded
    }

    /// Undo every journaled ledger change, newest first. Changes backing an
    /// interaction that could not be compensated are kept so the ledger still
    /// matches custody.
    pub fn rollback(self, state: &mut EngineState) {
        for (index, change) in self.changes.iter().enumerate().rev() {
            if self.stranded.contains(&index) {
                msg!("Keeping {:?}: its transfer could not be undone", change);
                continue;
            }
            if let Err(err) = change.inverse().apply(state) {
                msg!("Rollback of {:?} failed: {}", change, err);
            }
        }
    }

    /// Keep the ledger changes and hand back the events to publish.
    pub fn commit(self) -> Vec<EngineEvent> {
        self.events
    }
}
