use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::Error;

/// Point in the schedule, counted as whole seconds since local midnight.
///
/// Timetables carry next-day arrivals as hours past 24 (for example
/// `25:10:00`); those parse into values beyond 86400 and are never
/// wrapped or rejected. Ordering and equality are defined solely by the
/// second count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Build a timestamp from a raw second count.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Build a timestamp from hour/minute/second components.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Seconds since local midnight.
    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTimestamp {
            input: input.to_string(),
        };

        let fields = input
            .split(':')
            .map(|field| field.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        let (hours, minutes, seconds) = match fields.as_slice() {
            [h, m] => (*h, *m, 0),
            [h, m, s] => (*h, *m, *s),
            _ => return Err(invalid()),
        };
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            self.0 / 60 % 60,
            self.0 % 60
        )
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
