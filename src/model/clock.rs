//! Timestamp normalization for merge comparisons.
//!
//! The persistent format stores times down to whole seconds, so an in-memory
//! value loaded from disk would appear strictly older than a same-second
//! value compared at full precision. Every ordering comparison between a
//! source and a target timestamp goes through [`serialized`] first.

use chrono::{DateTime, Duration, Utc};

/// Truncate a timestamp to whole seconds.
pub fn serialized(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_sub_second_precision() {
        let t = DateTime::from_timestamp(1_000, 123_456_789).unwrap();
        assert_eq!(serialized(t), DateTime::from_timestamp(1_000, 0).unwrap());
    }

    #[test]
    fn whole_seconds_are_unchanged() {
        let t = DateTime::from_timestamp(1_000, 0).unwrap();
        assert_eq!(serialized(t), t);
    }

    #[test]
    fn same_second_values_compare_equal_after_normalization() {
        let a = DateTime::from_timestamp(1_000, 999_000_000).unwrap();
        let b = DateTime::from_timestamp(1_000, 1_000_000).unwrap();
        assert_ne!(a, b);
        assert_eq!(serialized(a), serialized(b));
    }
}
