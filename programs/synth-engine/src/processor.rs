use solana_program::{entrypoint::ProgramResult, msg, pubkey::Pubkey};

use crate::{engine::SynthEngine, instructions::SynthEngineInstruction};

/// Decode `instruction_data` and run it against `engine` on behalf of `signer`.
pub fn process_instruction(
    engine: &SynthEngine,
    signer: &Pubkey,
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = SynthEngineInstruction::unpack(instruction_data)?;

    match instruction {
        SynthEngineInstruction::DepositCollateral { asset, amount } => {
            msg!("Instruction: DepositCollateral");
            engine.deposit_collateral(signer, &asset, amount)?;
        }

        SynthEngineInstruction::MintDebt { amount } => {
            msg!("Instruction: MintDebt");
            engine.mint_debt(signer, amount)?;
        }

        SynthEngineInstruction::DepositCollateralAndMint {
            asset,
            collateral_amount,
            mint_amount,
        } => {
            msg!("Instruction: DepositCollateralAndMint");
            engine.deposit_collateral_and_mint(signer, &asset, collateral_amount, mint_amount)?;
        }

        SynthEngineInstruction::RedeemCollateral {
            asset,
            amount,
            recipient,
        } => {
            msg!("Instruction: RedeemCollateral");
            engine.redeem_collateral(signer, &asset, amount, &recipient)?;
        }

        SynthEngineInstruction::BurnDebt { amount } => {
            msg!("Instruction: BurnDebt");
            engine.burn_debt(signer, amount)?;
        }

        SynthEngineInstruction::RedeemCollateralForDebt {
            asset,
            collateral_amount,
            burn_amount,
        } => {
            msg!("Instruction: RedeemCollateralForDebt");
            engine.redeem_collateral_for_debt(signer, &asset, collateral_amount, burn_amount)?;
        }

        SynthEngineInstruction::Liquidate {
            asset,
            user,
            debt_to_cover,
        } => {
            msg!("Instruction: Liquidate");
            let seized = engine.liquidate(signer, &asset, &user, debt_to_cover)?;
            msg!("Liquidation seized {} of {}", seized, asset);
        }
    }

    Ok(())
}
