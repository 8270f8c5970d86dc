//! The five timestamps attached to every entry and group.

use chrono::{DateTime, Utc};

use crate::model::clock;
use crate::model::compare::CompareOptions;

/// Per-item time bookkeeping.
///
/// All values are millisecond-precision in memory; the persistent format
/// only keeps whole seconds, which is why merge ordering normalizes through
/// [`clock::serialized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInfo {
    pub creation: DateTime<Utc>,
    pub last_modification: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    /// Stamped whenever the item's parent group changes.
    pub location_changed: DateTime<Utc>,
}

impl TimeInfo {
    /// All five timestamps set to `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        TimeInfo {
            creation: at,
            last_modification: at,
            last_access: at,
            expiry: at,
            location_changed: at,
        }
    }

    /// Equality under the given comparison options.
    pub fn matches(&self, other: &TimeInfo, options: CompareOptions) -> bool {
        let eq = |a: DateTime<Utc>, b: DateTime<Utc>| {
            if options.ignore_milliseconds {
                clock::serialized(a) == clock::serialized(b)
            } else {
                a == b
            }
        };
        eq(self.creation, other.creation)
            && eq(self.last_modification, other.last_modification)
            && eq(self.last_access, other.last_access)
            && eq(self.expiry, other.expiry)
            && (options.ignore_location || eq(self.location_changed, other.location_changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64, millis: u32) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, millis * 1_000_000).unwrap()
    }

    #[test]
    fn sub_second_drift_matches_only_at_second_precision() {
        let a = TimeInfo::new(ts(100, 0));
        let b = TimeInfo::new(ts(100, 500));
        assert!(!a.matches(&b, CompareOptions::EXACT));
        assert!(a.matches(&b, CompareOptions::SECONDS));
    }

    #[test]
    fn location_changed_is_skipped_when_ignoring_location() {
        let a = TimeInfo::new(ts(100, 0));
        let mut b = a;
        b.location_changed = ts(200, 0);
        assert!(!a.matches(&b, CompareOptions::EXACT));
        assert!(a.matches(&b, CompareOptions::EXACT.and_ignore_location()));
    }
}
