use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::{CapabilityError, SynthEngineError},
    math::{self, DECIMALS, PRECISION},
};

/// Raw answer from a price feed: `price * 10^-decimals` USD per whole unit.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleQuote {
    pub price: i128,
    pub decimals: u8,
    pub as_of: i64,
}

/// Price capability. Implementations own freshness and validity checks and must
/// return an error rather than a fallback value.
pub trait PriceOracle: Send + Sync {
    fn quote(&self, feed: &Pubkey) -> Result<OracleQuote, CapabilityError>;
}

/// A validated quote rescaled to 18 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetPrice {
    pub asset: Pubkey,
    /// USD per whole unit, 18 decimals
    pub price: u128,
    pub as_of: i64,
}

impl AssetPrice {
    pub fn from_quote(asset: Pubkey, quote: OracleQuote) -> Result<Self, SynthEngineError> {
        let unavailable = |source| SynthEngineError::OracleUnavailable { asset, source };

        if quote.price <= 0 {
            return Err(unavailable(CapabilityError::InvalidPrice));
        }
        let raw = quote.price as u128;

        // Feeds usually report 8 decimals; bring everything to 18
        let price = if quote.decimals <= DECIMALS {
            let scale = math::pow10(DECIMALS - quote.decimals)
                .map_err(|_| unavailable(CapabilityError::InvalidPrice))?;
            raw.checked_mul(scale)
                .ok_or_else(|| unavailable(CapabilityError::InvalidPrice))?
        } else {
            // Past 10^38 every u128 price rounds to zero
            let scale = math::pow10(quote.decimals - DECIMALS)
                .map_err(|_| unavailable(CapabilityError::InvalidPrice))?;
            raw / scale
        };
        if price == 0 {
            return Err(unavailable(CapabilityError::InvalidPrice));
        }

        Ok(Self {
            asset,
            price,
            as_of: quote.as_of,
        })
    }

    /// USD value (18 decimals) of `amount` units.
    pub fn to_usd(&self, amount: u128) -> Result<u128, SynthEngineError> {
        math::mul_div(amount, self.price, PRECISION)
    }

    /// Units of the asset worth `usd_amount`, rounded down.
    pub fn from_usd(&self, usd_amount: u128) -> Result<u128, SynthEngineError> {
        math::mul_div(usd_amount, PRECISION, self.price)
    }
}

/// Fetch and validate a single quote.
pub fn fetch_price(
    oracle: &dyn PriceOracle,
    asset: Pubkey,
    feed: &Pubkey,
) -> Result<AssetPrice, SynthEngineError> {
    let quote = oracle
        .quote(feed)
        .map_err(|source| SynthEngineError::OracleUnavailable { asset, source })?;
    AssetPrice::from_quote(asset, quote)
}

/// Per-operation memo of asset prices. The first lookup of an asset hits the
/// oracle; every later conversion within the operation reuses that snapshot.
pub struct QuoteCache<'a> {
    oracle: &'a dyn PriceOracle,
    prices: BTreeMap<Pubkey, AssetPrice>,
}

impl<'a> QuoteCache<'a> {
    pub fn new(oracle: &'a dyn PriceOracle) -> Self {
        Self {
            oracle,
            prices: BTreeMap::new(),
        }
    }

    pub fn price(&mut self, asset: Pubkey, feed: &Pubkey) -> Result<AssetPrice, SynthEngineError> {
        if let Some(price) = self.prices.get(&asset) {
            return Ok(*price);
        }

        let price = fetch_price(self.oracle, asset, feed)?;
        msg!("Quote {}: {} (as of {})", asset, price.price, price.as_of);
        self.prices.insert(asset, price);
        Ok(price)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
