//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Seconds remaining in a cycle of `period_s` that started `elapsed_s` ago.
///
/// Returns `None` if the cycle has overrun.
pub fn cycle_remainder_s(period_s: f64, elapsed_s: f64) -> Option<f64> {
    if elapsed_s > period_s {
        None
    } else {
        Some(period_s - elapsed_s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }

    #[test]
    fn test_cycle_remainder() {
        assert_eq!(cycle_remainder_s(0.5, 0.25), Some(0.25));
        assert_eq!(cycle_remainder_s(0.5, 0.75), None);
    }
}
