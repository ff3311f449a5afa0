//! Weekday names.

use crate::error::{PlanError, Result};
use std::fmt;
use std::str::FromStr;

/// Day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days in week order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Zero-based position in the week (Monday = 0).
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Day at the given zero-based position, if any.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Upper-case name as used in roster records.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "MONDAY",
            Weekday::Tuesday => "TUESDAY",
            Weekday::Wednesday => "WEDNESDAY",
            Weekday::Thursday => "THURSDAY",
            Weekday::Friday => "FRIDAY",
            Weekday::Saturday => "SATURDAY",
            Weekday::Sunday => "SUNDAY",
        }
    }
}

impl FromStr for Weekday {
    type Err = PlanError;

    /// Parses an upper-case day name. Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|day| day.name() == s)
            .ok_or_else(|| PlanError::Parse(format!("invalid day '{s}'")))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for day in Weekday::ALL {
            assert_eq!(day.name().parse::<Weekday>().unwrap(), day);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(matches!("Monday".parse::<Weekday>(), Err(PlanError::Parse(_))));
        assert!(matches!("LUNDI".parse::<Weekday>(), Err(PlanError::Parse(_))));
    }

    #[test]
    fn test_index() {
        assert_eq!(Weekday::Monday.index(), 0);
        assert_eq!(Weekday::Sunday.index(), 6);
        assert_eq!(Weekday::from_index(2), Some(Weekday::Wednesday));
        assert_eq!(Weekday::from_index(7), None);
    }
}
