use crate::math::{self, PRECISION};

/// Share of nominal collateral value counted toward solvency (50%).
pub const LIQUIDATION_THRESHOLD: u128 = 50;

/// Denominator for the threshold and the bonus.
pub const LIQUIDATION_PRECISION: u128 = 100;

/// Extra collateral paid to a liquidator on top of the covered debt (10%).
pub const LIQUIDATION_BONUS: u128 = 10;

/// Positions at or above this ratio are healthy.
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

/// Health factor for `total_debt` backed by `collateral_value_usd`.
///
/// `(collateral * THRESHOLD / LIQUIDATION_PRECISION) * PRECISION / debt`, so 200%
/// nominal collateralization yields exactly `PRECISION`. Zero debt returns
/// `u128::MAX`, as does any ratio too large to represent.
pub fn calculate_health_factor(total_debt: u128, collateral_value_usd: u128) -> u128 {
    if total_debt == 0 {
        return u128::MAX;
    }

    let adjusted = math::mul_div_saturating(
        collateral_value_usd,
        LIQUIDATION_THRESHOLD,
        LIQUIDATION_PRECISION,
    );
    math::mul_div_saturating(adjusted, PRECISION, total_debt)
}

pub fn is_healthy(health_factor: u128) -> bool {
    health_factor >= MIN_HEALTH_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_debt_is_max() {
        assert_eq!(calculate_health_factor(0, 0), u128::MAX);
        assert_eq!(calculate_health_factor(0, 1_000 * PRECISION), u128::MAX);
    }

    #[test]
    fn test_double_collateral_is_exactly_one() {
        let debt = 1_234 * PRECISION;
        assert_eq!(calculate_health_factor(debt, 2 * debt), PRECISION);
        assert!(is_healthy(calculate_health_factor(debt, 2 * debt)));
        assert!(!is_healthy(calculate_health_factor(debt, 2 * debt - 2)));
    }

    #[test]
    fn test_reference_ratios() {
        // $20,000 collateral against $50 debt
        assert_eq!(
            calculate_health_factor(50 * PRECISION, 20_000 * PRECISION),
            200 * PRECISION
        );
        // $90 collateral against $50 debt
        assert_eq!(
            calculate_health_factor(50 * PRECISION, 90 * PRECISION),
            900_000_000_000_000_000
        );
    }

    #[test]
    fn test_saturates_instead_of_overflowing() {
        assert_eq!(calculate_health_factor(1, u128::MAX), u128::MAX);
    }
}
