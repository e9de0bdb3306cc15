//! Discounts
//!
//! Percentage discount arithmetic in currency minor units.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A zero discount.
pub fn no_discount() -> Percentage {
    Percentage::from(Decimal::ZERO)
}

/// Return the fraction a percentage represents, e.g. `0.10` for 10%.
pub fn fraction(percent: &Percentage) -> Decimal {
    // decimal_percentage doesn't expose the underlying Decimal
    (*percent) * Decimal::ONE
}

/// Whether a percentage is a usable discount fraction, in `[0, 1)`.
pub fn is_valid_discount(percent: &Percentage) -> bool {
    let value = fraction(percent);

    value >= Decimal::ZERO && value < Decimal::ONE
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Rounds half away from zero to the nearest minor unit.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    fraction(percent)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Calculate the amount taken off `subtotal` by `percent`.
///
/// # Errors
///
/// Returns an error if the percentage calculation overflows.
pub fn discount_on(
    subtotal: &Money<'static, Currency>,
    percent: &Percentage,
) -> Result<Money<'static, Currency>, DiscountError> {
    let discount_minor = percent_of_minor(percent, subtotal.to_minor_units())?;

    Ok(Money::from_minor(discount_minor, subtotal.currency()))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_of_minor_calculates_correctly() -> TestResult {
        let percent = Percentage::from(Decimal::new(25, 2));
        let result = percent_of_minor(&percent, 200)?;

        assert_eq!(result, 50);

        Ok(())
    }

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        let percent = Percentage::from(Decimal::new(15, 2));

        // 15% of 1.50 is 0.225
        assert_eq!(percent_of_minor(&percent, 150)?, 23);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(Decimal::TWO);
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));
    }

    #[test]
    fn discount_on_takes_percentage_of_subtotal() -> TestResult {
        let subtotal = Money::from_minor(13_000, USD);
        let discount = discount_on(&subtotal, &Percentage::from(Decimal::new(20, 2)))?;

        assert_eq!(discount, Money::from_minor(2_600, USD));

        Ok(())
    }

    #[test]
    fn no_discount_takes_nothing_off() -> TestResult {
        let subtotal = Money::from_minor(999, GBP);

        assert_eq!(discount_on(&subtotal, &no_discount())?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn valid_discounts_are_below_one() {
        assert!(is_valid_discount(&no_discount()));
        assert!(is_valid_discount(&Percentage::from(Decimal::new(99, 2))));
        assert!(!is_valid_discount(&Percentage::from(Decimal::ONE)));
        assert!(!is_valid_discount(&Percentage::from(Decimal::NEGATIVE_ONE)));
    }
}
