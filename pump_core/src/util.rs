//! Common time helpers for pump_core.

use std::time::Duration;

/// Number of seconds in one minute.
pub const SECS_PER_MINUTE: f64 = 60.0;
/// Number of seconds in one hour.
pub const SECS_PER_HOUR: f64 = 3_600.0;

/// Convert fractional seconds to a `Duration`.
/// - Negative and NaN inputs clamp to zero.
/// - Values beyond `Duration::MAX` saturate.
#[inline]
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Convert whole minutes (possibly fractional) to a `Duration`.
#[inline]
pub fn minutes(m: f64) -> Duration {
    secs_to_duration(m * SECS_PER_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_negative_and_nan() {
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn saturates_on_overflow() {
        assert_eq!(secs_to_duration(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn minutes_scale() {
        assert_eq!(minutes(30.0), Duration::from_secs(1_800));
        assert_eq!(minutes(0.5), Duration::from_secs(30));
    }
}
