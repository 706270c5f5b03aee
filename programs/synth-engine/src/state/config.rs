use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::SynthEngineError;

/// Maximum number of collateral assets a config account can hold.
pub const MAX_COLLATERAL_ASSETS: usize = 16;

/// Construction-time configuration of the engine. Immutable once the engine is built.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Account the capabilities move custody funds into and out of
    pub custody: Pubkey,

    /// Synthetic debt token
    pub debt_token: Pubkey,

    /// Registered collateral assets, in registration order
    pub collateral_assets: Vec<Pubkey>,

    /// Price feed for each asset, same order as `collateral_assets`
    pub price_feeds: Vec<Pubkey>,
}

impl EngineConfig {
    pub const DISCRIMINATOR: [u8; 8] = [83, 89, 78, 95, 67, 79, 78, 70]; // "SYN_CONF"

    pub const LEN: usize = 8 + // discriminator
        32 + // custody
        32 + // debt_token
        4 + (32 * MAX_COLLATERAL_ASSETS) + // collateral_assets
        4 + (32 * MAX_COLLATERAL_ASSETS); // price_feeds

    pub fn new(
        custody: Pubkey,
        debt_token: Pubkey,
        collateral_assets: Vec<Pubkey>,
        price_feeds: Vec<Pubkey>,
    ) -> Result<Self, SynthEngineError> {
        let config = Self {
            discriminator: Self::DISCRIMINATOR,
            custody,
            debt_token,
            collateral_assets,
            price_feeds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Decode a serialized config and validate it.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SynthEngineError> {
        let config = Self::try_from_slice(data).map_err(|_| SynthEngineError::InvalidConfig)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SynthEngineError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(SynthEngineError::InvalidConfig);
        }

        if self.collateral_assets.len() != self.price_feeds.len() {
            return Err(SynthEngineError::ConfigLengthMismatch {
                assets: self.collateral_assets.len(),
                feeds: self.price_feeds.len(),
            });
        }

        if self.collateral_assets.len() > MAX_COLLATERAL_ASSETS {
            return Err(SynthEngineError::InvalidConfig);
        }

        for (i, asset) in self.collateral_assets.iter().enumerate() {
            if self.collateral_assets[..i].contains(asset) {
                return Err(SynthEngineError::DuplicateAsset(*asset));
            }
        }

        Ok(())
    }

    pub fn price_feed(&self, asset: &Pubkey) -> Option<Pubkey> {
        self.collateral_assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.price_feeds[i])
    }

    pub fn is_registered(&self, asset: &Pubkey) -> bool {
        self.collateral_assets.contains(asset)
    }
}
