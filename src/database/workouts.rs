// ABOUTME: Database operations for workout templates
// ABOUTME: Minimal CRUD surface so plans and occurrences have something to reference
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::errors::{AppError, AppResult};
use crate::models::Workout;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Request to create a new workout
#[derive(Debug, Clone)]
pub struct CreateWorkoutRequest {
    /// Display name
    pub name: String,
    /// Coach attribution, if any
    pub coach_name: Option<String>,
}

/// Workout database operations manager
pub struct WorkoutsManager {
    pool: SqlitePool,
}

impl WorkoutsManager {
    /// Create a new workouts manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new workout
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, request: &CreateWorkoutRequest) -> AppResult<Workout> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO workouts (id, name, coach_name, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id.to_string())
        .bind(&request.name)
        .bind(&request.coach_name)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Workout {
            id,
            name: request.name.clone(),
            coach_name: request.coach_name.clone(),
            created_at: now,
        })
    }

    /// Get a workout by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, workout_id: Uuid) -> AppResult<Option<Workout>> {
        let row = sqlx::query(
            r"
            SELECT id, name, coach_name, created_at
            FROM workouts
            WHERE id = $1
            ",
        )
        .bind(workout_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_workout(&r)).transpose()
    }

    /// List all workouts, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list(&self) -> AppResult<Vec<Workout>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, coach_name, created_at
            FROM workouts
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_workout).collect()
    }
}

/// Convert a database row to a `Workout`
fn row_to_workout(row: &SqliteRow) -> AppResult<Workout> {
    let id_str: String = row.get("id");
    let created_at_str: String = row.get("created_at");

    Ok(Workout {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))?,
        name: row.get("name"),
        coach_name: row.get("coach_name"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))?
            .with_timezone(&Utc),
    })
}
