//! Bar period codes as written by the archive producer (`S10`, `M1`, `H4`,
//! `D1`, `W1`, `MN1`).

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Errors produced when parsing a bar period code.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseBarPeriodError {
    /// The code was empty or only whitespace.
    #[snafu(display("bar period is empty"))]
    Empty,

    /// The code had no unit prefix.
    #[snafu(display("bar period '{spec}' is missing a unit prefix (expected S|M|H|D|W|MN)"))]
    MissingUnit {
        /// The period code as given.
        spec: String,
    },

    /// The code had no count after the unit.
    #[snafu(display("bar period '{spec}' is missing a count"))]
    MissingNumber {
        /// The period code as given.
        spec: String,
    },

    /// The count failed to parse.
    #[snafu(display("invalid count in bar period '{spec}': {source}"))]
    InvalidNumber {
        /// The period code as given.
        spec: String,
        /// The parse error returned by `u32::from_str`.
        source: std::num::ParseIntError,
    },

    /// The count was zero.
    #[snafu(display("bar period count must be > 0 in '{spec}'"))]
    NonPositive {
        /// The period code as given.
        spec: String,
    },

    /// The unit prefix is not one the producer writes.
    #[snafu(display("unknown bar period unit '{unit}' in '{spec}' (expected S|M|H|D|W|MN)"))]
    UnknownUnit {
        /// The period code as given.
        spec: String,
        /// The unrecognized prefix.
        unit: String,
    },
}

/// Sampling interval of a bar archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarPeriod {
    /// `S<n>`
    Seconds(u32),
    /// `M<n>`
    Minutes(u32),
    /// `H<n>`
    Hours(u32),
    /// `D<n>`
    Days(u32),
    /// `W<n>`
    Weeks(u32),
    /// `MN<n>`
    Months(u32),
}

impl BarPeriod {
    /// Fixed length of one bar, or `None` for month periods.
    pub fn duration(&self) -> Option<Duration> {
        let n = i64::from(self.count());
        match *self {
            BarPeriod::Seconds(_) => Some(Duration::seconds(n)),
            BarPeriod::Minutes(_) => Some(Duration::minutes(n)),
            BarPeriod::Hours(_) => Some(Duration::hours(n)),
            BarPeriod::Days(_) => Some(Duration::days(n)),
            BarPeriod::Weeks(_) => Some(Duration::weeks(n)),
            BarPeriod::Months(_) => None,
        }
    }

    /// Number of units per bar.
    pub fn count(&self) -> u32 {
        match *self {
            BarPeriod::Seconds(n)
            | BarPeriod::Minutes(n)
            | BarPeriod::Hours(n)
            | BarPeriod::Days(n)
            | BarPeriod::Weeks(n)
            | BarPeriod::Months(n) => n,
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            BarPeriod::Seconds(_) => "S",
            BarPeriod::Minutes(_) => "M",
            BarPeriod::Hours(_) => "H",
            BarPeriod::Days(_) => "D",
            BarPeriod::Weeks(_) => "W",
            BarPeriod::Months(_) => "MN",
        }
    }
}

impl fmt::Display for BarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.unit(), self.count())
    }
}

impl FromStr for BarPeriod {
    type Err = ParseBarPeriodError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let spec = input.trim();
        if spec.is_empty() {
            return Err(ParseBarPeriodError::Empty);
        }

        // Unit prefix runs up to the first digit.
        let digits_start = spec
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(spec.len());

        if digits_start == 0 {
            return Err(ParseBarPeriodError::MissingUnit {
                spec: spec.to_string(),
            });
        }

        let (unit_str, num_str) = spec.split_at(digits_start);
        if num_str.is_empty() {
            return Err(ParseBarPeriodError::MissingNumber {
                spec: spec.to_string(),
            });
        }

        let n: u32 = num_str
            .parse()
            .map_err(|source| ParseBarPeriodError::InvalidNumber {
                spec: spec.to_string(),
                source,
            })?;
        if n == 0 {
            return Err(ParseBarPeriodError::NonPositive {
                spec: spec.to_string(),
            });
        }

        match unit_str.to_ascii_uppercase().as_str() {
            "S" => Ok(BarPeriod::Seconds(n)),
            "M" => Ok(BarPeriod::Minutes(n)),
            "H" => Ok(BarPeriod::Hours(n)),
            "D" => Ok(BarPeriod::Days(n)),
            "W" => Ok(BarPeriod::Weeks(n)),
            "MN" => Ok(BarPeriod::Months(n)),
            _ => Err(ParseBarPeriodError::UnknownUnit {
                spec: spec.to_string(),
                unit: unit_str.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_producer_codes() {
        let cases = [
            ("S10", BarPeriod::Seconds(10)),
            ("M1", BarPeriod::Minutes(1)),
            ("M15", BarPeriod::Minutes(15)),
            ("H4", BarPeriod::Hours(4)),
            ("D1", BarPeriod::Days(1)),
            ("W1", BarPeriod::Weeks(1)),
            ("MN1", BarPeriod::Months(1)),
            ("mn1", BarPeriod::Months(1)),
            (" h1 ", BarPeriod::Hours(1)),
        ];

        for (input, expected) in cases {
            assert_eq!(input.parse::<BarPeriod>().unwrap(), expected, "{input:?}");
        }
    }

    #[test]
    fn display_is_the_canonical_code() {
        for code in ["S10", "M1", "H4", "D1", "W1", "MN1"] {
            assert_eq!(code.parse::<BarPeriod>().unwrap().to_string(), code);
        }
    }

    #[test]
    fn durations_are_fixed_except_months() {
        assert_eq!(BarPeriod::Seconds(10).duration(), Some(Duration::seconds(10)));
        assert_eq!(BarPeriod::Hours(4).duration(), Some(Duration::hours(4)));
        assert_eq!(BarPeriod::Weeks(1).duration(), Some(Duration::days(7)));
        assert_eq!(BarPeriod::Months(1).duration(), None);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert_eq!("".parse::<BarPeriod>(), Err(ParseBarPeriodError::Empty));
        assert!(matches!(
            "10".parse::<BarPeriod>(),
            Err(ParseBarPeriodError::MissingUnit { .. })
        ));
        assert!(matches!(
            "MN".parse::<BarPeriod>(),
            Err(ParseBarPeriodError::MissingNumber { .. })
        ));
        assert!(matches!(
            "M1x".parse::<BarPeriod>(),
            Err(ParseBarPeriodError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "H0".parse::<BarPeriod>(),
            Err(ParseBarPeriodError::NonPositive { .. })
        ));
        assert!(matches!(
            "Y1".parse::<BarPeriod>(),
            Err(ParseBarPeriodError::UnknownUnit { unit, .. }) if unit == "Y"
        ));
    }
}
