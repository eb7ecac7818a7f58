use rust_decimal::Decimal;

use crate::error::QuoteError;
use crate::QuoteCalcResult;

// Decimal's operators panic on overflow; every figure derived from user input
// goes through these instead.

fn overflow(context: &str) -> QuoteError {
    QuoteError::Overflow {
        context: context.into(),
    }
}

pub(crate) fn add(a: Decimal, b: Decimal, context: &str) -> QuoteCalcResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(context))
}

pub(crate) fn sub(a: Decimal, b: Decimal, context: &str) -> QuoteCalcResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}

pub(crate) fn mul(a: Decimal, b: Decimal, context: &str) -> QuoteCalcResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(context))
}

/// `a / b`; a zero divisor is `DivisionByZero`, an unrepresentable quotient `Overflow`.
pub(crate) fn div(a: Decimal, b: Decimal, context: &str) -> QuoteCalcResult<Decimal> {
    if b.is_zero() {
        return Err(QuoteError::DivisionByZero {
            context: context.into(),
        });
    }
    a.checked_div(b).ok_or_else(|| overflow(context))
}

pub(crate) fn sum(
    values: impl IntoIterator<Item = Decimal>,
    context: &str,
) -> QuoteCalcResult<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| add(acc, v, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_range_matches_operators() {
        assert_eq!(mul(dec!(1.5), dec!(4), "t").unwrap(), dec!(6));
        assert_eq!(div(dec!(9), dec!(0.9), "t").unwrap(), dec!(10));
        assert_eq!(sum([dec!(1), dec!(2.5), dec!(3)], "t").unwrap(), dec!(6.5));
    }

    #[test]
    fn test_overflow_is_an_error() {
        match mul(Decimal::MAX, dec!(2), "line item total").unwrap_err() {
            QuoteError::Overflow { context } => assert_eq!(context, "line item total"),
            e => panic!("Expected Overflow, got {e:?}"),
        }
        assert!(add(Decimal::MAX, Decimal::ONE, "t").is_err());
        assert!(div(Decimal::MAX, dec!(0.001), "t").is_err());
    }

    #[test]
    fn test_zero_divisor_is_division_by_zero() {
        match div(Decimal::ONE, Decimal::ZERO, "payback").unwrap_err() {
            QuoteError::DivisionByZero { context } => assert_eq!(context, "payback"),
            e => panic!("Expected DivisionByZero, got {e:?}"),
        }
    }
}
