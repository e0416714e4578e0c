// ABOUTME: Shared domain types for the Cadence fitness API
// ABOUTME: Weekday numeric mapping, week status classification, and core entities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! Shared domain models
//!
//! [`Weekday`] carries an explicit `Monday=0 .. Sunday=6` integer mapping.
//! All ordering and rotation in the scheduler goes through
//! [`Weekday::numeric_value`], never through enum declaration order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Day of the week with an explicit numeric mapping (Monday=0 .. Sunday=6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
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
    /// All weekdays in canonical order
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Numeric value with Monday=0 .. Sunday=6
    #[must_use]
    pub const fn numeric_value(&self) -> u32 {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }

    /// Weekday for a numeric value (taken modulo 7)
    #[must_use]
    pub const fn from_numeric(value: u32) -> Self {
        match value % 7 {
            0 => Self::Monday,
            1 => Self::Tuesday,
            2 => Self::Wednesday,
            3 => Self::Thursday,
            4 => Self::Friday,
            5 => Self::Saturday,
            _ => Self::Sunday,
        }
    }

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Parse from string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monday" => Some(Self::Monday),
            "tuesday" => Some(Self::Tuesday),
            "wednesday" => Some(Self::Wednesday),
            "thursday" => Some(Self::Thursday),
            "friday" => Some(Self::Friday),
            "saturday" => Some(Self::Saturday),
            "sunday" => Some(Self::Sunday),
            _ => None,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Self::from_numeric(day.num_days_from_monday())
    }
}

impl PartialOrd for Weekday {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weekday {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.numeric_value().cmp(&other.numeric_value())
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a day of the current week relates to a participation's occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    /// No occurrence scheduled that day
    None,
    /// Occurrence exists and was completed
    Done,
    /// Occurrence exists, incomplete, and its date is before today
    Missed,
    /// Occurrence exists, incomplete, scheduled today or later
    Pending,
}

/// A registered end user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Email address (unique)
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A workout template referenced by plan slots and planned occurrences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Coach attribution, if any
    pub coach_name: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_numeric_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from_numeric(day.numeric_value()), day);
        }
    }

    #[test]
    fn test_weekday_string_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::parse(day.as_str()), Some(day));
        }
        assert_eq!(Weekday::parse("someday"), None);
    }

    #[test]
    fn test_weekday_ordering_is_numeric() {
        let mut days = vec![Weekday::Sunday, Weekday::Wednesday, Weekday::Monday];
        days.sort();
        assert_eq!(
            days,
            vec![Weekday::Monday, Weekday::Wednesday, Weekday::Sunday]
        );
    }

    #[test]
    fn test_weekday_from_chrono() {
        assert_eq!(Weekday::from(chrono::Weekday::Mon), Weekday::Monday);
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
    }
}
