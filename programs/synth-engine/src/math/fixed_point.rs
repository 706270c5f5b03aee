use primitive_types::U256;

use crate::error::SynthEngineError;

/// 18-decimal fixed point: `PRECISION` represents 1.0.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Decimals carried by every ledger amount and USD value.
pub const DECIMALS: u8 = 18;

/// `a * b / denominator` with a 256-bit intermediate, rounding down.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, SynthEngineError> {
    if denominator == 0 {
        return Err(SynthEngineError::DivisionByZero);
    }

    let product = U256::from(a) * U256::from(b);
    narrow(product / U256::from(denominator))
}

/// Same as [`mul_div`] but clamps to `u128::MAX` instead of failing on overflow.
pub fn mul_div_saturating(a: u128, b: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        return u128::MAX;
    }

    let product = U256::from(a) * U256::from(b);
    narrow(product / U256::from(denominator)).unwrap_or(u128::MAX)
}

pub fn checked_add(a: u128, b: u128) -> Result<u128, SynthEngineError> {
    a.checked_add(b).ok_or(SynthEngineError::ArithmeticOverflow)
}

/// 10^exp as u128, failing past 10^38.
pub fn pow10(exp: u8) -> Result<u128, SynthEngineError> {
    10u128
        .checked_pow(exp as u32)
        .ok_or(SynthEngineError::ArithmeticOverflow)
}

fn narrow(value: U256) -> Result<u128, SynthEngineError> {
    if value > U256::from(u128::MAX) {
        return Err(SynthEngineError::ArithmeticOverflow);
    }
    Ok(value.low_u128())
}
