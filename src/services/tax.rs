use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Result of applying a tax rate to an order subtotal.
///
/// `tax_amount` is zero when the rate is zero (tax-exempt); rendering uses
/// that to decide whether to show a tax breakdown at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Computes tax and grand total for a subtotal.
///
/// Rounding happens exactly once, on the subtotal × rate product, half-up to
/// two decimal places. Per-line rounding would compound error across lines,
/// so lines are never rounded individually.
pub fn compute(subtotal: Decimal, tax_rate: Decimal) -> Result<TaxBreakdown, ServiceError> {
    if subtotal.is_sign_negative() {
        return Err(ServiceError::InvalidInput(format!(
            "subtotal must be non-negative, got {}",
            subtotal
        )));
    }
    if tax_rate.is_sign_negative() {
        return Err(ServiceError::InvalidInput(format!(
            "tax rate must be non-negative, got {}",
            tax_rate
        )));
    }

    let tax_amount =
        (subtotal * tax_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let total = subtotal + tax_amount;

    Ok(TaxBreakdown { tax_amount, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(100.00), dec!(0.05), dec!(5.00), dec!(105.00))]
    #[case(dec!(33.33), dec!(0.05), dec!(1.67), dec!(35.00))]
    #[case(dec!(589.00), dec!(0.05), dec!(29.45), dec!(618.45))]
    #[case(dec!(199.00), dec!(0.18), dec!(35.82), dec!(234.82))]
    #[case(dec!(0.00), dec!(0.05), dec!(0.00), dec!(0.00))]
    fn computes_expected_breakdowns(
        #[case] subtotal: Decimal,
        #[case] rate: Decimal,
        #[case] expected_tax: Decimal,
        #[case] expected_total: Decimal,
    ) {
        let breakdown = compute(subtotal, rate).expect("valid inputs");
        assert_eq!(breakdown.tax_amount, expected_tax);
        assert_eq!(breakdown.total, expected_total);
    }

    #[test]
    fn midpoints_round_up() {
        // 2.50 * 0.05 = 0.125, exactly between 0.12 and 0.13
        let breakdown = compute(dec!(2.50), dec!(0.05)).expect("valid inputs");
        assert_eq!(breakdown.tax_amount, dec!(0.13));
        assert_eq!(breakdown.total, dec!(2.63));
    }

    #[test]
    fn rounding_is_applied_once_not_per_line() {
        // Three lines of 33.33 rounded per line would give 1.67 * 3 = 5.01;
        // a single rounding of the 99.99 subtotal gives 5.00.
        let breakdown = compute(dec!(99.99), dec!(0.05)).expect("valid inputs");
        assert_eq!(breakdown.tax_amount, dec!(5.00));
        assert_eq!(breakdown.total, dec!(104.99));
    }

    #[test]
    fn zero_rate_is_exempt() {
        let breakdown = compute(dec!(589.00), Decimal::ZERO).expect("valid inputs");
        assert_eq!(breakdown.tax_amount, Decimal::ZERO);
        assert_eq!(breakdown.total, dec!(589.00));
    }

    #[test]
    fn negative_rate_is_rejected() {
        assert!(compute(dec!(100.00), dec!(-0.05)).is_err());
    }

    #[test]
    fn negative_subtotal_is_rejected() {
        assert!(compute(dec!(-1.00), dec!(0.05)).is_err());
    }
}
