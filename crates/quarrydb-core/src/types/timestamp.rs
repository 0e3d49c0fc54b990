use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Timestamp
///
/// Seconds since the Unix epoch plus a non-negative nanosecond fraction.
/// `nanos` is always in `0..NANOS_PER_SECOND`.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Timestamp {
    seconds: i64,
    nanos: i32,
}

impl Timestamp {
    pub const NANOS_PER_SECOND: i32 = 1_000_000_000;

    pub const EPOCH: Self = Self {
        seconds: 0,
        nanos: 0,
    };

    /// Build a timestamp, carrying out-of-range nanoseconds into seconds.
    #[must_use]
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        let carry = nanos.div_euclid(Self::NANOS_PER_SECOND);
        let nanos = nanos.rem_euclid(Self::NANOS_PER_SECOND);

        Self {
            seconds: seconds.saturating_add(carry as i64),
            nanos,
        }
    }

    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        let seconds = micros.div_euclid(1_000_000);
        #[allow(clippy::cast_possible_truncation)]
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as i32;

        Self { seconds, nanos }
    }

    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    #[must_use]
    pub const fn nanos(&self) -> i32 {
        self.nanos
    }

    /// The smallest timestamp strictly greater than `self`.
    #[must_use]
    pub const fn successor(&self) -> Self {
        if self.nanos + 1 == Self::NANOS_PER_SECOND {
            Self {
                seconds: self.seconds.saturating_add(1),
                nanos: 0,
            }
        } else {
            Self {
                seconds: self.seconds,
                nanos: self.nanos + 1,
            }
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_carries_overflowing_nanos() {
        assert_eq!(Timestamp::new(1, 1_500_000_000), Timestamp::new(2, 500_000_000));
        assert_eq!(Timestamp::new(1, -1), Timestamp::new(0, 999_999_999));
    }

    #[test]
    fn successor_rolls_into_next_second() {
        let ts = Timestamp::new(5, 999_999_999);

        assert_eq!(ts.successor(), Timestamp::new(6, 0));
        assert!(ts < ts.successor());
    }

    #[test]
    fn from_micros_handles_negative_values() {
        assert_eq!(Timestamp::from_micros(-1), Timestamp::new(-1, 999_999_000));
    }
}
