// ABOUTME: Database operations for coach-authored fitness plan templates
// ABOUTME: Handles plan CRUD, ordered weeks/slots, and the release freeze
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! Fitness plan template storage
//!
//! A template is a name, a workouts-per-week count, and an ordered list of
//! weeks each holding an ordered list of workout slots. `week_order` and
//! `workout_order` are written contiguously from 1 by construction and
//! backed by unique constraints. Releasing a plan freezes its weeks.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// A fitness plan template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessPlan {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Number of distinct workout days required per week
    pub workouts_per_week: u32,
    /// Whether the plan is released (weeks frozen)
    pub is_released: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// One workout slot within a plan week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWeekWorkout {
    /// Unique identifier
    pub id: Uuid,
    /// Referenced workout template
    pub workout_id: Uuid,
    /// 1-based order within the week
    pub order: u32,
}

/// One week of a plan with its ordered workout slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWeek {
    /// Unique identifier
    pub id: Uuid,
    /// 1-based order within the plan
    pub order: u32,
    /// Ordered workout slots
    pub workouts: Vec<PlanWeekWorkout>,
}

/// A plan together with its ordered weeks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessPlanDetail {
    /// The plan row
    #[serde(flatten)]
    pub plan: FitnessPlan,
    /// Ordered weeks with their slots
    pub weeks: Vec<PlanWeek>,
}

/// Request to create a new plan
#[derive(Debug, Clone)]
pub struct CreatePlanRequest {
    /// Display name
    pub name: String,
    /// Number of distinct workout days per week (> 0)
    pub workouts_per_week: u32,
}

/// Fitness plan database operations manager
pub struct PlansManager {
    pool: SqlitePool,
}

impl PlansManager {
    /// Create a new plans manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new plan template
    ///
    /// # Errors
    ///
    /// Returns a validation error when `workouts_per_week` is zero
    pub async fn create(&self, request: &CreatePlanRequest) -> AppResult<FitnessPlan> {
        if request.workouts_per_week == 0 {
            return Err(AppError::invalid_input(
                "workouts_per_week must be greater than zero",
            ));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO fitness_plans (id, name, workouts_per_week, is_released, created_at, updated_at)
            VALUES ($1, $2, $3, 0, $4, $4)
            ",
        )
        .bind(id.to_string())
        .bind(&request.name)
        .bind(i64::from(request.workouts_per_week))
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(FitnessPlan {
            id,
            name: request.name.clone(),
            workouts_per_week: request.workouts_per_week,
            is_released: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a plan by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, plan_id: Uuid) -> AppResult<Option<FitnessPlan>> {
        let row = sqlx::query(
            r"
            SELECT id, name, workouts_per_week, is_released, created_at, updated_at
            FROM fitness_plans
            WHERE id = $1
            ",
        )
        .bind(plan_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_plan(&r)).transpose()
    }

    /// Get a plan with its ordered weeks and slots
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_detail(&self, plan_id: Uuid) -> AppResult<Option<FitnessPlanDetail>> {
        let Some(plan) = self.get(plan_id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r"
            SELECT w.id AS week_id, w.week_order,
                   s.id AS slot_id, s.workout_id, s.workout_order
            FROM fitness_plan_weeks w
            LEFT JOIN fitness_plan_week_workouts s ON s.fitness_plan_week_id = w.id
            WHERE w.fitness_plan_id = $1
            ORDER BY w.week_order ASC, s.workout_order ASC
            ",
        )
        .bind(plan_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut weeks: Vec<PlanWeek> = Vec::new();
        for row in &rows {
            let week_id = parse_uuid(&row.get::<String, _>("week_id"))?;
            let week_order = u32::try_from(row.get::<i64, _>("week_order"))
                .map_err(|e| AppError::internal(format!("Invalid week order: {e}")))?;

            if weeks.last().map_or(true, |w| w.id != week_id) {
                weeks.push(PlanWeek {
                    id: week_id,
                    order: week_order,
                    workouts: Vec::new(),
                });
            }

            // LEFT JOIN: a week with no slots yields NULL slot columns
            let slot_id: Option<String> = row.get("slot_id");
            if let Some(slot_id) = slot_id {
                let workout_id: String = row.get("workout_id");
                let workout_order = u32::try_from(row.get::<i64, _>("workout_order"))
                    .map_err(|e| AppError::internal(format!("Invalid slot order: {e}")))?;
                if let Some(week) = weeks.last_mut() {
                    week.workouts.push(PlanWeekWorkout {
                        id: parse_uuid(&slot_id)?,
                        workout_id: parse_uuid(&workout_id)?,
                        order: workout_order,
                    });
                }
            }
        }

        Ok(Some(FitnessPlanDetail { plan, weeks }))
    }

    /// List all plans, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list(&self, released_only: bool) -> AppResult<Vec<FitnessPlan>> {
        let filter = if released_only {
            "WHERE is_released = 1"
        } else {
            ""
        };
        let query = format!(
            r"
            SELECT id, name, workouts_per_week, is_released, created_at, updated_at
            FROM fitness_plans
            {filter}
            ORDER BY created_at DESC
            "
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_plan).collect()
    }

    /// Replace the weeks of an unreleased plan
    ///
    /// `weeks` is a list of ordered workout-id lists; week and slot orders
    /// are assigned contiguously from 1. The whole replacement runs in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the plan is released, or not-found
    /// for an unknown plan
    pub async fn replace_weeks(&self, plan_id: Uuid, weeks: &[Vec<Uuid>]) -> AppResult<()> {
        let plan = self
            .get(plan_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Fitness plan {plan_id}")))?;

        if plan.is_released {
            return Err(AppError::invalid_transition(
                "Released plans are frozen and cannot be modified",
            ));
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM fitness_plan_weeks WHERE fitness_plan_id = $1")
            .bind(plan_id.to_string())
            .execute(&mut *tx)
            .await?;

        for (week_idx, workout_ids) in weeks.iter().enumerate() {
            let week_id = Uuid::new_v4();
            sqlx::query(
                r"
                INSERT INTO fitness_plan_weeks (id, fitness_plan_id, week_order)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(week_id.to_string())
            .bind(plan_id.to_string())
            .bind(i64::try_from(week_idx + 1).unwrap_or(i64::MAX))
            .execute(&mut *tx)
            .await?;

            for (slot_idx, workout_id) in workout_ids.iter().enumerate() {
                sqlx::query(
                    r"
                    INSERT INTO fitness_plan_week_workouts
                        (id, fitness_plan_week_id, workout_id, workout_order)
                    VALUES ($1, $2, $3, $4)
                    ",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(week_id.to_string())
                .bind(workout_id.to_string())
                .bind(i64::try_from(slot_idx + 1).unwrap_or(i64::MAX))
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query("UPDATE fitness_plans SET updated_at = $1 WHERE id = $2")
            .bind(&now)
            .bind(plan_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Release a plan, freezing its weeks (one-way)
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown plan
    pub async fn release(&self, plan_id: Uuid) -> AppResult<FitnessPlan> {
        let result = sqlx::query(
            r"
            UPDATE fitness_plans SET is_released = 1, updated_at = $1
            WHERE id = $2
            ",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(plan_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Fitness plan {plan_id}")));
        }

        self.get(plan_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Fitness plan {plan_id}")))
    }

    /// Delete a plan; weeks and slots cascade
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, plan_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM fitness_plans WHERE id = $1")
            .bind(plan_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_uuid(s: &str) -> AppResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))
}

/// Convert a database row to a `FitnessPlan`
pub(crate) fn row_to_plan(row: &SqliteRow) -> AppResult<FitnessPlan> {
    let id_str: String = row.get("id");
    let workouts_per_week: i64 = row.get("workouts_per_week");
    let is_released: i64 = row.get("is_released");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(FitnessPlan {
        id: parse_uuid(&id_str)?,
        name: row.get("name"),
        workouts_per_week: u32::try_from(workouts_per_week)
            .map_err(|e| AppError::internal(format!("Invalid workouts_per_week: {e}")))?,
        is_released: is_released == 1,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))?
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
            .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))?
            .with_timezone(&Utc),
    })
}
