//! Conversion between display amounts and integer base units.
//!
//! Pure and deterministic, no I/O. A jetton balance travels on the wire as
//! an integer count of its smallest unit; the UI wants a decimal number.

/// Convert a base-unit amount into a display amount.
///
/// `units_to_amount(1_500_000, 6)` is `1.5`.
pub fn units_to_amount(units: u128, decimals: u32) -> f64 {
    units as f64 / 10f64.powi(decimals as i32)
}

/// Convert a display amount into base units, rounding down.
///
/// Rounding down avoids overstating a spendable quantity. Negative or
/// non-finite amounts map to zero.
///
/// The scaled product can land one ULP below an integer for decimally-exact
/// amounts (0.000249 × 1e6 = 248.999…97), so values within a hair of an
/// integer snap to it before flooring; genuinely fractional remainders still
/// floor.
pub fn amount_to_units(amount: f64, decimals: u32) -> u128 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    let scaled = amount * 10f64.powi(decimals as i32);
    let nearest = scaled.round();
    let units = if (scaled - nearest).abs() < 1e-6 {
        nearest
    } else {
        scaled.floor()
    };
    units as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_to_amount() {
        assert_eq!(units_to_amount(1_500_000, 6), 1.5);
        assert_eq!(units_to_amount(0, 6), 0.0);
        assert_eq!(units_to_amount(1, 0), 1.0);
        assert_eq!(units_to_amount(1_000_000_000, 9), 1.0);
    }

    #[test]
    fn test_amount_to_units_floors() {
        assert_eq!(amount_to_units(1.5, 6), 1_500_000);
        // 1.9999999 * 10^6 floors to 1_999_999, never rounds up.
        assert_eq!(amount_to_units(1.999_999_9, 6), 1_999_999);
        assert_eq!(amount_to_units(0.0, 6), 0);
    }

    #[test]
    fn test_amount_to_units_rejects_garbage() {
        assert_eq!(amount_to_units(-3.0, 6), 0);
        assert_eq!(amount_to_units(f64::NAN, 6), 0);
        assert_eq!(amount_to_units(f64::INFINITY, 6), 0);
    }

    #[test]
    fn test_round_trip() {
        // Exactly representable under 6 decimals, including values whose
        // scaled product falls one ULP below the integer.
        for units in [
            0u128,
            1,
            7,
            249,
            999_999,
            1_000_001,
            1_500_000,
            123_456_789,
            10u128.pow(15),
        ] {
            assert_eq!(amount_to_units(units_to_amount(units, 6), 6), units);
        }
    }
}
