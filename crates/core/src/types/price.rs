//! Chilean peso formatting.
//!
//! Amounts are carried as [`Decimal`] pesos. CLP has no minor unit, so display
//! rounds to whole pesos and groups thousands with dots (`$12.990`).

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as Chilean pesos, e.g. `$1.234.567`.
///
/// ```
/// use delicias_core::format_clp;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_clp(Decimal::new(1_290_000, 2)), "$12.900");
/// assert_eq!(format_clp(Decimal::ZERO), "$0");
/// ```
#[must_use]
pub fn format_clp(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_small_amounts() {
        assert_eq!(format_clp(Decimal::new(990, 0)), "$990");
        assert_eq!(format_clp(Decimal::new(1000, 0)), "$1.000");
    }

    #[test]
    fn test_format_large_amount() {
        assert_eq!(format_clp(Decimal::new(12_345_678, 0)), "$12.345.678");
    }

    #[test]
    fn test_format_rounds_half_up() {
        assert_eq!(format_clp(Decimal::new(10_005, 1)), "$1.001");
        assert_eq!(format_clp(Decimal::new(10_004, 1)), "$1.000");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_clp(Decimal::new(-2500, 0)), "-$2.500");
    }
}
