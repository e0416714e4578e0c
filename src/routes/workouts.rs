// ABOUTME: Route handlers for workout templates and workout completion
// ABOUTME: Completion merges into today's planned occurrence or records an ad-hoc one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::database::participations::UserWorkout;
use crate::database::workouts::CreateWorkoutRequest;
use crate::errors::AppError;
use crate::models::Workout;
use crate::server::ServerResources;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Response for a workout
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkoutResponse {
    pub id: String,
    pub name: String,
    pub coach_name: Option<String>,
    pub created_at: String,
}

impl From<Workout> for WorkoutResponse {
    fn from(workout: Workout) -> Self {
        Self {
            id: workout.id.to_string(),
            name: workout.name,
            coach_name: workout.coach_name,
            created_at: workout.created_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a workout
#[derive(Debug, Deserialize)]
pub struct CreateWorkoutBody {
    pub name: String,
    pub coach_name: Option<String>,
}

/// Request body for completing a workout
#[derive(Debug, Deserialize)]
pub struct CompleteWorkoutBody {
    pub workout_id: Uuid,
}

/// Response for a planned or completed occurrence
#[derive(Debug, Serialize, Deserialize)]
pub struct UserWorkoutResponse {
    pub id: String,
    pub workout_id: String,
    pub participation_id: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl From<UserWorkout> for UserWorkoutResponse {
    fn from(occurrence: UserWorkout) -> Self {
        Self {
            id: occurrence.id.to_string(),
            workout_id: occurrence.workout_id.to_string(),
            participation_id: occurrence.participation_id.map(|id| id.to_string()),
            started_at: occurrence.started_at.to_rfc3339(),
            completed_at: occurrence.completed_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Workouts routes handler
pub struct WorkoutsRoutes;

impl WorkoutsRoutes {
    /// Create all workout routes
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/workouts", post(Self::handle_create))
            .route("/api/workouts", get(Self::handle_list))
            .route("/api/workouts/:id", get(Self::handle_get))
            .route("/api/user-workouts", post(Self::handle_complete))
            .with_state(resources)
    }

    /// Handle POST /api/workouts - Create a workout template
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateWorkoutBody>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let workout = resources
            .database
            .workouts()
            .create(&CreateWorkoutRequest {
                name: body.name,
                coach_name: body.coach_name,
            })
            .await?;

        let response: WorkoutResponse = workout.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/workouts - List workouts
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let workouts = resources.database.workouts().list().await?;
        let response: Vec<WorkoutResponse> = workouts.into_iter().map(Into::into).collect();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/workouts/:id - Get a workout
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let workout = resources
            .database
            .workouts()
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Workout {id}")))?;

        let response: WorkoutResponse = workout.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/user-workouts - Record a workout completion
    async fn handle_complete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CompleteWorkoutBody>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate(&headers).await?;

        let occurrence = resources
            .database
            .participations()
            .complete_workout(auth.user_id, body.workout_id, Utc::now())
            .await?;

        let response: UserWorkoutResponse = occurrence.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }
}
