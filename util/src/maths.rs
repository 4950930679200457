//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, ToPrimitive};

/// Clamp a value into the inclusive range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: PartialOrd
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Round a float to the nearest integer (half away from zero) and saturate it
/// into `[min, max]`.
///
/// Non-finite values saturate to the matching bound, `NAN` maps to zero
/// clamped into range.
pub fn round_clamp_i32<T>(value: T, min: i32, max: i32) -> i32
where
    T: Float
{
    if value.is_nan() {
        return clamp(0, min, max);
    }

    let rounded = value.round();

    match rounded.to_i32() {
        Some(v) => clamp(v, min, max),
        None if rounded > T::zero() => max,
        None => min
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, -1, 3), 3);
        assert_eq!(clamp(-5, -1, 3), -1);
        assert_eq!(clamp(2, -1, 3), 2);
        assert_eq!(clamp(0.5f64, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_round_clamp_i32() {
        assert_eq!(round_clamp_i32(-168.0f64, -100, 100), -100);
        assert_eq!(round_clamp_i32(39.0f64, -100, 100), 39);
        assert_eq!(round_clamp_i32(2.5f64, -100, 100), 3);
        assert_eq!(round_clamp_i32(-2.5f64, -100, 100), -3);
        assert_eq!(round_clamp_i32(f64::INFINITY, -100, 100), 100);
        assert_eq!(round_clamp_i32(f64::NEG_INFINITY, -100, 100), -100);
        assert_eq!(round_clamp_i32(f64::NAN, -100, 100), 0);
        assert_eq!(round_clamp_i32(1e30f64, -100, 100), 100);
    }
}
