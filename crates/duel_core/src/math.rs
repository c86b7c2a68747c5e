//! Fixed-point math utilities for reproducible damage formulas.
//!
//! All fractional combat math (defense reduction, critical multiplier,
//! elemental multiplier) runs on fixed-point numbers so that a seeded
//! battle produces the same numbers on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for all combat math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Convert a whole percentage into a fixed-point fraction (`150` -> `1.5`).
#[must_use]
pub fn percent(value: u32) -> Fixed {
    Fixed::saturating_from_num(value) / Fixed::from_num(100)
}

/// Convert an unsigned stat into a fixed-point number, saturating on overflow.
#[must_use]
pub fn from_stat(value: u32) -> Fixed {
    Fixed::saturating_from_num(value)
}

/// Round to the nearest whole number (half away from zero) and clamp into `u32`.
#[must_use]
pub fn round_to_u32(value: Fixed) -> u32 {
    let rounded: i64 = value.round().to_num();
    u32::try_from(rounded.max(0)).unwrap_or(u32::MAX)
}

/// Floor into `u32`, clamping negatives to zero.
#[must_use]
pub fn floor_to_u32(value: Fixed) -> u32 {
    let floored: i64 = value.floor().to_num();
    u32::try_from(floored.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_conversion() {
        assert_eq!(percent(100), Fixed::ONE);
        assert_eq!(percent(150), Fixed::from_num(3) / Fixed::from_num(2));
        assert_eq!(percent(0), Fixed::ZERO);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to_u32(Fixed::from_num(7.5)), 8);
        assert_eq!(round_to_u32(Fixed::from_num(7.49)), 7);
        assert_eq!(round_to_u32(Fixed::from_num(-3)), 0);
    }

    #[test]
    fn test_floor() {
        assert_eq!(floor_to_u32(Fixed::from_num(7.99)), 7);
        assert_eq!(floor_to_u32(Fixed::from_num(-0.5)), 0);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = from_stat(1234) * percent(150);
        let b = from_stat(1234) * percent(150);
        assert_eq!(a, b);
        assert_eq!(round_to_u32(a), 1851);
    }
}
