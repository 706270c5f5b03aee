use std::{collections::BTreeMap, sync::Arc};

use solana_program::pubkey::Pubkey;

use crate::error::{CapabilityError, SynthEngineError};

/// Transfer capability for one collateral asset.
///
/// `pull` is allowance-gated: the owner must have approved `custody` beforehand.
pub trait CollateralToken: Send + Sync {
    fn asset_id(&self) -> Pubkey;

    /// Move `amount` from `owner` into engine custody.
    fn pull(&self, owner: &Pubkey, custody: &Pubkey, amount: u128) -> Result<(), CapabilityError>;

    /// Move `amount` out of engine custody to `to`.
    fn push(&self, custody: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), CapabilityError>;
}

/// The synthetic debt token. The engine holds its mint authority.
pub trait DebtToken: Send + Sync {
    fn token_id(&self) -> Pubkey;

    fn mint_to(&self, to: &Pubkey, amount: u128) -> Result<(), CapabilityError>;

    /// Destroy `amount` held by `custody`.
    fn burn(&self, custody: &Pubkey, amount: u128) -> Result<(), CapabilityError>;

    fn pull(&self, owner: &Pubkey, custody: &Pubkey, amount: u128) -> Result<(), CapabilityError>;

    fn push(&self, custody: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), CapabilityError>;
}

/// Capability handles the engine was constructed with.
pub struct Capabilities {
    pub custody: Pubkey,
    pub collateral: BTreeMap<Pubkey, Arc<dyn CollateralToken>>,
    pub debt_token: Arc<dyn DebtToken>,
}

impl Capabilities {
    pub fn collateral_token(
        &self,
        asset: &Pubkey,
    ) -> Result<Arc<dyn CollateralToken>, SynthEngineError> {
        self.collateral
            .get(asset)
            .cloned()
            .ok_or(SynthEngineError::AssetNotAllowed(*asset))
    }
}
