// ABOUTME: Pure date arithmetic for projecting plan templates onto a user's calendar
// ABOUTME: Computes start dates, rotated weekday cycles, and per-slot occurrence dates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! # Participation scheduling core
//!
//! A plan template is weekday-agnostic: it only knows "day 1 of week 1",
//! "day 2 of week 1", and so on. The user's chosen weekdays are overlaid at
//! join time. [`WeekSchedule`] rotates the chosen days so the cycle begins
//! at the computed start weekday, which guarantees the first template slot
//! lands exactly on the start date and later slots land on the chosen
//! weekdays in the same relative order, repeating every cycle length.
//!
//! Everything here is pure; persistence lives in `database::participations`.

use crate::models::{Weekday, WeekStatus};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;

/// A user's weekly schedule anchored to a concrete start date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSchedule {
    start_date: NaiveDate,
    /// Chosen weekdays rotated so the cycle begins at the start weekday
    cycle: Vec<Weekday>,
}

impl WeekSchedule {
    /// Build a schedule for the given chosen weekdays, anchored at `today`
    ///
    /// The start date is the first chosen weekday at or after today's
    /// weekday; when every chosen day falls earlier in the week, the
    /// schedule wraps to the earliest chosen day of next week. A chosen
    /// weekday equal to today's weekday starts the plan today.
    ///
    /// Returns `None` when `chosen_days` is empty.
    #[must_use]
    pub fn new(today: NaiveDate, chosen_days: &BTreeSet<Weekday>) -> Option<Self> {
        // BTreeSet iterates in canonical weekday order (Ord is numeric)
        let sorted_days: Vec<Weekday> = chosen_days.iter().copied().collect();
        if sorted_days.is_empty() {
            return None;
        }

        let today_weekday = today.weekday().num_days_from_monday();
        let start_index = sorted_days
            .iter()
            .position(|day| day.numeric_value() >= today_weekday)
            .unwrap_or(0);
        let start_day = sorted_days[start_index];

        let days_until_start = (start_day.numeric_value() + 7 - today_weekday) % 7;
        let start_date = today + Duration::days(i64::from(days_until_start));

        // Left-rotate so the cycle begins at the start weekday
        let mut cycle = sorted_days;
        cycle.rotate_left(start_index);

        Some(Self { start_date, cycle })
    }

    /// Date of the first scheduled occurrence
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// The rotated weekday cycle, beginning at the start weekday
    #[must_use]
    pub fn cycle(&self) -> &[Weekday] {
        &self.cycle
    }

    /// Compute calendar dates for `slot_count` template slots
    ///
    /// Slot *i* is paired with `cycle[i % cycle_len]` and the cursor
    /// advances to the next occurrence of that weekday. Past the first
    /// slot, a repeated weekday (cycle length 1 wrapping onto itself)
    /// advances a full week rather than landing on the same date, so the
    /// resulting dates are strictly increasing after the start date.
    #[must_use]
    pub fn occurrence_dates(&self, slot_count: usize) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(slot_count);
        let mut cursor = self.start_date;

        for (slot, day) in self.cycle.iter().cycle().take(slot_count).enumerate() {
            let cursor_weekday = cursor.weekday().num_days_from_monday();
            let mut days_until_next = (day.numeric_value() + 7 - cursor_weekday) % 7;
            if slot > 0 && days_until_next == 0 {
                days_until_next = 7;
            }
            cursor += Duration::days(i64::from(days_until_next));
            dates.push(cursor);
        }

        dates
    }
}

/// Classify one planned occurrence relative to `today`
#[must_use]
pub fn occurrence_status(
    started_at: NaiveDate,
    completed_at: Option<DateTime<Utc>>,
    today: NaiveDate,
) -> WeekStatus {
    if completed_at.is_some() {
        WeekStatus::Done
    } else if started_at < today {
        WeekStatus::Missed
    } else {
        WeekStatus::Pending
    }
}

/// Monday of the calendar week containing `today`
#[must_use]
pub fn start_of_week(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn days(list: &[Weekday]) -> BTreeSet<Weekday> {
        list.iter().copied().collect()
    }

    #[test]
    fn empty_chosen_days_yield_no_schedule() {
        assert!(WeekSchedule::new(date(2025, 6, 5), &BTreeSet::new()).is_none());
    }

    #[test]
    fn starts_today_when_today_is_chosen() {
        // 2025-06-02 is a Monday
        let today = date(2025, 6, 2);
        let schedule =
            WeekSchedule::new(today, &days(&[Weekday::Monday, Weekday::Thursday])).unwrap();
        assert_eq!(schedule.start_date(), today);
        assert_eq!(schedule.cycle(), &[Weekday::Monday, Weekday::Thursday]);
    }

    #[test]
    fn picks_first_chosen_day_at_or_after_today() {
        // 2025-06-03 is a Tuesday; Wednesday is the first chosen day >= Tuesday
        let today = date(2025, 6, 3);
        let schedule =
            WeekSchedule::new(today, &days(&[Weekday::Monday, Weekday::Wednesday])).unwrap();
        assert_eq!(schedule.start_date(), date(2025, 6, 4));
        assert_eq!(schedule.cycle(), &[Weekday::Wednesday, Weekday::Monday]);
    }

    #[test]
    fn wraps_to_earliest_chosen_day_next_week() {
        // 2025-06-07 is a Saturday; Mon/Wed are both earlier in the week
        let today = date(2025, 6, 7);
        let schedule =
            WeekSchedule::new(today, &days(&[Weekday::Monday, Weekday::Wednesday])).unwrap();
        assert_eq!(schedule.start_date(), date(2025, 6, 9));
        assert_eq!(schedule.cycle(), &[Weekday::Monday, Weekday::Wednesday]);
    }

    #[test]
    fn spec_scenario_mon_wed_fri_join_on_thursday() {
        // 2025-06-05 is a Thursday (weekday 3); sorted = [Mon(0), Wed(2), Fri(4)];
        // first >= 3 is Friday, so the plan starts tomorrow
        let today = date(2025, 6, 5);
        let chosen = days(&[Weekday::Monday, Weekday::Wednesday, Weekday::Friday]);
        let schedule = WeekSchedule::new(today, &chosen).unwrap();

        assert_eq!(schedule.start_date(), date(2025, 6, 6));
        assert_eq!(
            schedule.cycle(),
            &[Weekday::Friday, Weekday::Monday, Weekday::Wednesday]
        );

        // Two template weeks of three slots each
        let dates = schedule.occurrence_dates(6);
        assert_eq!(
            dates,
            vec![
                date(2025, 6, 6),  // Fri
                date(2025, 6, 9),  // Mon
                date(2025, 6, 11), // Wed
                date(2025, 6, 13), // Fri
                date(2025, 6, 16), // Mon
                date(2025, 6, 18), // Wed
            ]
        );

        // Strictly increasing, weekdays cycling through the rotated order
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for (i, d) in dates.iter().enumerate() {
            assert_eq!(
                Weekday::from(d.weekday()),
                schedule.cycle()[i % schedule.cycle().len()]
            );
        }
    }

    #[test]
    fn first_occurrence_always_lands_on_start_date() {
        let today = date(2025, 6, 5);
        for day in Weekday::ALL {
            let schedule = WeekSchedule::new(today, &days(&[day])).unwrap();
            let dates = schedule.occurrence_dates(3);
            assert_eq!(dates[0], schedule.start_date());
            assert!(days(&[day]).contains(&Weekday::from(dates[0].weekday())));
        }
    }

    #[test]
    fn single_day_plan_advances_a_full_week_per_slot() {
        // One workout per week: the same weekday repeats, +7 days each time
        let today = date(2025, 6, 2); // Monday
        let schedule = WeekSchedule::new(today, &days(&[Weekday::Monday])).unwrap();
        let dates = schedule.occurrence_dates(4);
        assert_eq!(
            dates,
            vec![
                date(2025, 6, 2),
                date(2025, 6, 9),
                date(2025, 6, 16),
                date(2025, 6, 23),
            ]
        );
    }

    #[test]
    fn occurrence_count_matches_slot_count() {
        let today = date(2025, 6, 5);
        let chosen = days(&[Weekday::Tuesday, Weekday::Saturday]);
        let schedule = WeekSchedule::new(today, &chosen).unwrap();
        for slots in [0, 1, 2, 7, 20] {
            assert_eq!(schedule.occurrence_dates(slots).len(), slots);
        }
    }

    #[test]
    fn occurrence_status_classification() {
        let today = date(2025, 6, 5);
        let completed = Utc.with_ymd_and_hms(2025, 6, 4, 18, 30, 0).single();

        assert_eq!(
            occurrence_status(date(2025, 6, 4), completed, today),
            WeekStatus::Done
        );
        assert_eq!(
            occurrence_status(date(2025, 6, 4), None, today),
            WeekStatus::Missed
        );
        assert_eq!(
            occurrence_status(today, None, today),
            WeekStatus::Pending
        );
        assert_eq!(
            occurrence_status(date(2025, 6, 7), None, today),
            WeekStatus::Pending
        );
    }

    #[test]
    fn start_of_week_is_monday() {
        assert_eq!(start_of_week(date(2025, 6, 5)), date(2025, 6, 2));
        assert_eq!(start_of_week(date(2025, 6, 2)), date(2025, 6, 2));
        assert_eq!(start_of_week(date(2025, 6, 8)), date(2025, 6, 2));
    }
}
