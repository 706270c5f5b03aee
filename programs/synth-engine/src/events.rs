use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

/// Events published when an operation commits. Rolled-back operations publish nothing.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    CollateralDeposited {
        user: Pubkey,
        asset: Pubkey,
        amount: u128,
    },

    CollateralRedeemed {
        from: Pubkey,
        to: Pubkey,
        asset: Pubkey,
        amount: u128,
    },

    DebtMinted {
        user: Pubkey,
        amount: u128,
    },

    DebtBurned {
        on_behalf_of: Pubkey,
        payer: Pubkey,
        amount: u128,
    },

    Liquidated {
        liquidator: Pubkey,
        user: Pubkey,
        asset: Pubkey,
        debt_covered: u128,
        collateral_seized: u128,
    },
}

impl EngineEvent {
    pub fn log(&self) {
        match self {
            EngineEvent::CollateralDeposited { user, asset, amount } => {
                msg!("CollateralDeposited: user={} asset={} amount={}", user, asset, amount);
            }
            EngineEvent::CollateralRedeemed { from, to, asset, amount } => {
                msg!(
                    "CollateralRedeemed: from={} to={} asset={} amount={}",
                    from, to, asset, amount
                );
            }
            EngineEvent::DebtMinted { user, amount } => {
                msg!("DebtMinted: user={} amount={}", user, amount);
            }
            EngineEvent::DebtBurned { on_behalf_of, payer, amount } => {
                msg!("DebtBurned: on_behalf_of={} payer={} amount={}", on_behalf_of, payer, amount);
            }
            EngineEvent::Liquidated {
                liquidator,
                user,
                asset,
                debt_covered,
                collateral_seized,
            } => {
                msg!(
                    "Liquidated: liquidator={} user={} asset={} debt_covered={} seized={}",
                    liquidator, user, asset, debt_covered, collateral_seized
                );
            }
        }
    }
}
