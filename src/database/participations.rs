// ABOUTME: Storage side of the participation scheduler
// ABOUTME: Join/leave transactions, planned occurrence rows, and the active-plan projection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! Participations and planned workout occurrences
//!
//! `join` runs as one transaction: deactivate the user's current
//! participation (deleting its future occurrences), insert the new
//! participation, then bulk-insert one occurrence per template slot at the
//! dates computed by [`crate::schedule::WeekSchedule`]. A failure anywhere
//! rolls the whole join back. The at-most-one-active invariant is the
//! partial unique index on `user_id WHERE is_active = 1`, so a concurrent
//! double-join surfaces as a conflict instead of a second active row.

use crate::errors::{AppError, AppResult};
use crate::models::{WeekStatus, Weekday};
use crate::schedule::{occurrence_status, start_of_week, WeekSchedule};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, SqlitePool};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::plans::FitnessPlan;

/// One user's enrollment in a plan template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    /// Unique identifier
    pub id: Uuid,
    /// Enrolled user
    pub user_id: Uuid,
    /// Plan template
    pub fitness_plan_id: Uuid,
    /// Date of the first scheduled occurrence
    pub started_at: NaiveDate,
    /// Whether this is the user's active enrollment
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One scheduled or completed workout instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWorkout {
    /// Unique identifier
    pub id: Uuid,
    /// Referenced workout template
    pub workout_id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Owning participation; ad-hoc completions have none
    pub participation_id: Option<Uuid>,
    /// Scheduled day
    pub started_at: DateTime<Utc>,
    /// Completion timestamp, set when the user finishes the workout
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-day classification of the current calendar week
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeekStatusMap {
    pub monday: WeekStatus,
    pub tuesday: WeekStatus,
    pub wednesday: WeekStatus,
    pub thursday: WeekStatus,
    pub friday: WeekStatus,
    pub saturday: WeekStatus,
    pub sunday: WeekStatus,
}

impl Default for WeekStatusMap {
    fn default() -> Self {
        Self {
            monday: WeekStatus::None,
            tuesday: WeekStatus::None,
            wednesday: WeekStatus::None,
            thursday: WeekStatus::None,
            friday: WeekStatus::None,
            saturday: WeekStatus::None,
            sunday: WeekStatus::None,
        }
    }
}

impl WeekStatusMap {
    /// Set the status for a weekday
    pub fn set(&mut self, day: Weekday, status: WeekStatus) {
        match day {
            Weekday::Monday => self.monday = status,
            Weekday::Tuesday => self.tuesday = status,
            Weekday::Wednesday => self.wednesday = status,
            Weekday::Thursday => self.thursday = status,
            Weekday::Friday => self.friday = status,
            Weekday::Saturday => self.saturday = status,
            Weekday::Sunday => self.sunday = status,
        }
    }

    /// Get the status for a weekday
    #[must_use]
    pub const fn get(&self, day: Weekday) -> WeekStatus {
        match day {
            Weekday::Monday => self.monday,
            Weekday::Tuesday => self.tuesday,
            Weekday::Wednesday => self.wednesday,
            Weekday::Thursday => self.thursday,
            Weekday::Friday => self.friday,
            Weekday::Saturday => self.saturday,
            Weekday::Sunday => self.sunday,
        }
    }
}

/// Read-side projection of a user's active plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivePlanView {
    /// The plan the user is enrolled in
    pub plan: FitnessPlan,
    /// Active participation id
    pub participation_id: Uuid,
    /// Date of the first scheduled occurrence
    pub started_at: NaiveDate,
    /// Today's planned occurrence, if one is scheduled
    pub todays_workout: Option<UserWorkout>,
    /// Classification of each day of the current week
    pub week_status: WeekStatusMap,
}

/// UTC midnight of a calendar day, in the stored RFC 3339 form
fn day_start(date: NaiveDate) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc).to_rfc3339()
}

/// Participation database operations manager
pub struct ParticipationsManager {
    pool: SqlitePool,
}

impl ParticipationsManager {
    /// Create a new participations manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Join a fitness plan, scheduling one occurrence per template slot
    ///
    /// `today` anchors the schedule; callers outside tests pass the current
    /// date. Any previously active participation for this user is
    /// deactivated first with its future occurrences deleted, which makes
    /// re-joining idempotent with respect to stale schedules.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown plan, a validation error when the
    /// chosen day count does not match the plan's `workouts_per_week`, and
    /// a conflict when a concurrent join wins the unique-index race
    pub async fn join(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        chosen_days: &BTreeSet<Weekday>,
        today: NaiveDate,
    ) -> AppResult<Participation> {
        let plan_row = sqlx::query(
            "SELECT workouts_per_week FROM fitness_plans WHERE id = $1",
        )
        .bind(plan_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Fitness plan {plan_id}")))?;
        let workouts_per_week: i64 = plan_row.get("workouts_per_week");

        if chosen_days.len() as i64 != workouts_per_week {
            return Err(AppError::invalid_input(format!(
                "You need to choose {workouts_per_week} days"
            )));
        }

        let schedule = WeekSchedule::new(today, chosen_days)
            .ok_or_else(|| AppError::invalid_input("No weekdays chosen"))?;
        let start_date = schedule.start_date();
        let now = Utc::now();
        let participation_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        // Deactivate whatever the user is currently enrolled in and drop
        // its occurrences from today onward; past rows stay as history
        let left: Vec<String> = sqlx::query_scalar(
            r"
            UPDATE fitness_plan_participations
            SET is_active = 0
            WHERE user_id = $1 AND is_active = 1
            RETURNING id
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&mut *tx)
        .await?;

        for old_id in &left {
            sqlx::query(
                r"
                DELETE FROM user_workouts
                WHERE participation_id = $1 AND started_at >= $2
                ",
            )
            .bind(old_id)
            .bind(day_start(today))
            .execute(&mut *tx)
            .await?;
        }

        // Staged write: the new row's id is needed as a foreign key below
        sqlx::query(
            r"
            INSERT INTO fitness_plan_participations
                (id, user_id, fitness_plan_id, started_at, is_active, created_at)
            VALUES ($1, $2, $3, $4, 1, $5)
            ",
        )
        .bind(participation_id.to_string())
        .bind(user_id.to_string())
        .bind(plan_id.to_string())
        .bind(start_date.format("%Y-%m-%d").to_string())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // Flattened slot sequence in template order
        let slot_workout_ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT s.workout_id
            FROM fitness_plan_week_workouts s
            JOIN fitness_plan_weeks w ON s.fitness_plan_week_id = w.id
            WHERE w.fitness_plan_id = $1
            ORDER BY w.week_order ASC, s.workout_order ASC
            ",
        )
        .bind(plan_id.to_string())
        .fetch_all(&mut *tx)
        .await?;

        if !slot_workout_ids.is_empty() {
            let dates = schedule.occurrence_dates(slot_workout_ids.len());

            let mut builder = QueryBuilder::new(
                "INSERT INTO user_workouts \
                 (id, workout_id, user_id, participation_id, started_at, completed_at) ",
            );
            builder.push_values(
                slot_workout_ids.iter().zip(dates.iter()),
                |mut b, (workout_id, date)| {
                    b.push_bind(Uuid::new_v4().to_string())
                        .push_bind(workout_id)
                        .push_bind(user_id.to_string())
                        .push_bind(participation_id.to_string())
                        .push_bind(day_start(*date))
                        .push_bind(Option::<String>::None);
                },
            );
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(Participation {
            id: participation_id,
            user_id,
            fitness_plan_id: plan_id,
            started_at: start_date,
            is_active: true,
            created_at: now,
        })
    }

    /// Leave a participation: delete occurrences from today onward and
    /// deactivate
    ///
    /// Leaving is one-way; a user who wants to resume must join again.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown participation and a validation
    /// error when it is already inactive
    pub async fn leave(
        &self,
        participation_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Participation> {
        let participation = self
            .get(participation_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Participation {participation_id}")))?;

        if !participation.is_active {
            return Err(AppError::invalid_transition(
                "You can't resume a fitness plan after leaving",
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM user_workouts
            WHERE participation_id = $1 AND started_at >= $2
            ",
        )
        .bind(participation_id.to_string())
        .bind(day_start(today))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE fitness_plan_participations SET is_active = 0 WHERE id = $1",
        )
        .bind(participation_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Participation {
            is_active: false,
            ..participation
        })
    }

    /// Get a participation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, participation_id: Uuid) -> AppResult<Option<Participation>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, fitness_plan_id, started_at, is_active, created_at
            FROM fitness_plan_participations
            WHERE id = $1
            ",
        )
        .bind(participation_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_participation(&r)).transpose()
    }

    /// Get the user's active participation, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_active(&self, user_id: Uuid) -> AppResult<Option<Participation>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, fitness_plan_id, started_at, is_active, created_at
            FROM fitness_plan_participations
            WHERE user_id = $1 AND is_active = 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_participation(&r)).transpose()
    }

    /// All occurrences owned by a participation, in date order
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn occurrences(&self, participation_id: Uuid) -> AppResult<Vec<UserWorkout>> {
        let rows = sqlx::query(
            r"
            SELECT id, workout_id, user_id, participation_id, started_at, completed_at
            FROM user_workouts
            WHERE participation_id = $1
            ORDER BY started_at ASC
            ",
        )
        .bind(participation_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user_workout).collect()
    }

    /// Read projection of the user's active plan for display
    ///
    /// Classifies each day of the current calendar week as none / done /
    /// missed / pending relative to `today`, and surfaces today's
    /// occurrence when one is scheduled. Nothing here is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn active_plan_view(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Option<ActivePlanView>> {
        let Some(participation) = self.get_active(user_id).await? else {
            return Ok(None);
        };

        let plan_row = sqlx::query(
            r"
            SELECT id, name, workouts_per_week, is_released, created_at, updated_at
            FROM fitness_plans
            WHERE id = $1
            ",
        )
        .bind(participation.fitness_plan_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        let plan = super::plans::row_to_plan(&plan_row)?;

        let week_start = start_of_week(today);
        let rows = sqlx::query(
            r"
            SELECT id, workout_id, user_id, participation_id, started_at, completed_at
            FROM user_workouts
            WHERE participation_id = $1 AND started_at >= $2 AND started_at < $3
            ORDER BY started_at ASC
            ",
        )
        .bind(participation.id.to_string())
        .bind(day_start(week_start))
        .bind(day_start(week_start + Duration::days(7)))
        .fetch_all(&self.pool)
        .await?;

        let mut week_status = WeekStatusMap::default();
        let mut todays_workout = None;
        for row in &rows {
            let occurrence = row_to_user_workout(row)?;
            let date = occurrence.started_at.date_naive();
            week_status.set(
                Weekday::from(date.weekday()),
                occurrence_status(date, occurrence.completed_at, today),
            );
            if date == today {
                todays_workout = Some(occurrence);
            }
        }

        Ok(Some(ActivePlanView {
            plan,
            participation_id: participation.id,
            started_at: participation.started_at,
            todays_workout,
            week_status,
        }))
    }

    /// Record a workout completion
    ///
    /// When a planned occurrence for this workout is scheduled today and
    /// not yet completed, it is marked done; otherwise an ad-hoc completed
    /// occurrence with no owning participation is recorded.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown workout
    pub async fn complete_workout(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<UserWorkout> {
        let today = now.date_naive();

        let planned = sqlx::query(
            r"
            SELECT id, workout_id, user_id, participation_id, started_at, completed_at
            FROM user_workouts
            WHERE user_id = $1 AND workout_id = $2
              AND completed_at IS NULL
              AND started_at >= $3 AND started_at < $4
            ",
        )
        .bind(user_id.to_string())
        .bind(workout_id.to_string())
        .bind(day_start(today))
        .bind(day_start(today + Duration::days(1)))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = planned {
            let mut occurrence = row_to_user_workout(&row)?;
            sqlx::query("UPDATE user_workouts SET completed_at = $1 WHERE id = $2")
                .bind(now.to_rfc3339())
                .bind(occurrence.id.to_string())
                .execute(&self.pool)
                .await?;
            occurrence.completed_at = Some(now);
            return Ok(occurrence);
        }

        let workout_exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM workouts WHERE id = $1")
                .bind(workout_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        if workout_exists.is_none() {
            return Err(AppError::not_found(format!("Workout {workout_id}")));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r"
            INSERT INTO user_workouts
                (id, workout_id, user_id, participation_id, started_at, completed_at)
            VALUES ($1, $2, $3, NULL, $4, $4)
            ",
        )
        .bind(id.to_string())
        .bind(workout_id.to_string())
        .bind(user_id.to_string())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(UserWorkout {
            id,
            workout_id,
            user_id,
            participation_id: None,
            started_at: now,
            completed_at: Some(now),
        })
    }
}

fn parse_uuid(s: &str) -> AppResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))
}

fn parse_datetime(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))
}

/// Convert a database row to a `Participation`
fn row_to_participation(row: &SqliteRow) -> AppResult<Participation> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let plan_id_str: String = row.get("fitness_plan_id");
    let started_at_str: String = row.get("started_at");
    let is_active: i64 = row.get("is_active");
    let created_at_str: String = row.get("created_at");

    Ok(Participation {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        fitness_plan_id: parse_uuid(&plan_id_str)?,
        started_at: NaiveDate::parse_from_str(&started_at_str, "%Y-%m-%d")
            .map_err(|e| AppError::internal(format!("Invalid date: {e}")))?,
        is_active: is_active == 1,
        created_at: parse_datetime(&created_at_str)?,
    })
}

/// Convert a database row to a `UserWorkout`
fn row_to_user_workout(row: &SqliteRow) -> AppResult<UserWorkout> {
    let id_str: String = row.get("id");
    let workout_id_str: String = row.get("workout_id");
    let user_id_str: String = row.get("user_id");
    let participation_id_str: Option<String> = row.get("participation_id");
    let started_at_str: String = row.get("started_at");
    let completed_at_str: Option<String> = row.get("completed_at");

    Ok(UserWorkout {
        id: parse_uuid(&id_str)?,
        workout_id: parse_uuid(&workout_id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        participation_id: participation_id_str.as_deref().map(parse_uuid).transpose()?,
        started_at: parse_datetime(&started_at_str)?,
        completed_at: completed_at_str.as_deref().map(parse_datetime).transpose()?,
    })
}
