use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

/// Operations a host runtime can dispatch to the engine. The signer of the
/// transaction is the acting user (or liquidator).
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum SynthEngineInstruction {
    /// Deposit collateral into custody
    /// Signer: depositor, must have approved custody for `amount`
    DepositCollateral {
        asset: Pubkey,
        amount: u128,
    },

    /// Mint synthetic debt against deposited collateral
    /// Signer: borrower
    MintDebt {
        amount: u128,
    },

    /// Deposit collateral and mint debt in one operation
    /// Signer: borrower
    DepositCollateralAndMint {
        asset: Pubkey,
        collateral_amount: u128,
        mint_amount: u128,
    },

    /// Redeem collateral to `recipient`
    /// Signer: position owner
    RedeemCollateral {
        asset: Pubkey,
        amount: u128,
        recipient: Pubkey,
    },

    /// Burn synthetic debt
    /// Signer: position owner, must have approved custody for `amount`
    BurnDebt {
        amount: u128,
    },

    /// Burn debt then redeem collateral back to the signer
    /// Signer: position owner
    RedeemCollateralForDebt {
        asset: Pubkey,
        collateral_amount: u128,
        burn_amount: u128,
    },

    /// Liquidate an unhealthy position
    /// Signer: liquidator, must hold and have approved `debt_to_cover`
    Liquidate {
        asset: Pubkey,
        user: Pubkey,
        debt_to_cover: u128,
    },
}

impl SynthEngineInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        borsh::to_vec(self).map_err(|_| ProgramError::InvalidInstructionData)
    }
}
