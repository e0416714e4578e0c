// ABOUTME: Route handlers for fitness plan templates and the active-plan projection
// ABOUTME: Plan authoring, release freeze, and GET /active with week status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::database::participations::{ActivePlanView, WeekStatusMap};
use crate::database::plans::{CreatePlanRequest, FitnessPlan, FitnessPlanDetail};
use crate::errors::AppError;
use crate::server::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::workouts::UserWorkoutResponse;

/// Response for a plan
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub workouts_per_week: u32,
    pub is_released: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FitnessPlan> for PlanResponse {
    fn from(plan: FitnessPlan) -> Self {
        Self {
            id: plan.id.to_string(),
            name: plan.name,
            workouts_per_week: plan.workouts_per_week,
            is_released: plan.is_released,
            created_at: plan.created_at.to_rfc3339(),
            updated_at: plan.updated_at.to_rfc3339(),
        }
    }
}

/// One week of a plan in detail responses
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanWeekResponse {
    pub order: u32,
    /// Workout ids in slot order
    pub workout_ids: Vec<String>,
}

/// Response for a plan with its weeks
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: PlanResponse,
    pub weeks: Vec<PlanWeekResponse>,
}

impl From<FitnessPlanDetail> for PlanDetailResponse {
    fn from(detail: FitnessPlanDetail) -> Self {
        Self {
            plan: detail.plan.into(),
            weeks: detail
                .weeks
                .into_iter()
                .map(|week| PlanWeekResponse {
                    order: week.order,
                    workout_ids: week
                        .workouts
                        .into_iter()
                        .map(|slot| slot.workout_id.to_string())
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Response for the active-plan projection
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivePlanResponse {
    #[serde(flatten)]
    pub plan: PlanResponse,
    pub participation_id: String,
    pub started_at: String,
    pub todays_workout: Option<UserWorkoutResponse>,
    pub week_status: WeekStatusMap,
}

impl From<ActivePlanView> for ActivePlanResponse {
    fn from(view: ActivePlanView) -> Self {
        Self {
            plan: view.plan.into(),
            participation_id: view.participation_id.to_string(),
            started_at: view.started_at.format("%Y-%m-%d").to_string(),
            todays_workout: view.todays_workout.map(Into::into),
            week_status: view.week_status,
        }
    }
}

/// Request body for creating a plan
#[derive(Debug, Deserialize)]
pub struct CreatePlanBody {
    pub name: String,
    pub workouts_per_week: u32,
}

/// Request body for replacing a plan's weeks
#[derive(Debug, Deserialize)]
pub struct ReplaceWeeksBody {
    /// Ordered weeks, each an ordered list of workout ids
    pub weeks: Vec<Vec<Uuid>>,
}

/// Query parameters for listing plans
#[derive(Debug, Deserialize, Default)]
pub struct ListPlansQuery {
    /// Only include released plans
    pub released_only: Option<bool>,
}

/// Plans routes handler
pub struct PlansRoutes;

impl PlansRoutes {
    /// Create all plan routes
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/fitness-plans", post(Self::handle_create))
            .route("/api/fitness-plans", get(Self::handle_list))
            .route("/api/fitness-plans/active", get(Self::handle_active))
            .route("/api/fitness-plans/:id", get(Self::handle_get))
            .route("/api/fitness-plans/:id", delete(Self::handle_delete))
            .route("/api/fitness-plans/:id/weeks", put(Self::handle_replace_weeks))
            .route("/api/fitness-plans/:id/release", post(Self::handle_release))
            .with_state(resources)
    }

    /// Handle POST /api/fitness-plans - Create a plan template
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreatePlanBody>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let plan = resources
            .database
            .plans()
            .create(&CreatePlanRequest {
                name: body.name,
                workouts_per_week: body.workouts_per_week,
            })
            .await?;

        let response: PlanResponse = plan.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/fitness-plans - List plans
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListPlansQuery>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let plans = resources
            .database
            .plans()
            .list(query.released_only.unwrap_or(false))
            .await?;
        let response: Vec<PlanResponse> = plans.into_iter().map(Into::into).collect();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/fitness-plans/active - The caller's active plan
    ///
    /// Returns JSON `null` when the user has no active participation.
    async fn handle_active(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate(&headers).await?;

        let view = resources
            .database
            .participations()
            .active_plan_view(auth.user_id, Utc::now().date_naive())
            .await?;

        let response: Option<ActivePlanResponse> = view.map(Into::into);
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/fitness-plans/:id - Plan with ordered weeks
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let detail = resources
            .database
            .plans()
            .get_detail(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Fitness plan {id}")))?;

        let response: PlanDetailResponse = detail.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/fitness-plans/:id/weeks - Replace weeks of an unreleased plan
    async fn handle_replace_weeks(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<ReplaceWeeksBody>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        resources
            .database
            .plans()
            .replace_weeks(id, &body.weeks)
            .await?;

        let detail = resources
            .database
            .plans()
            .get_detail(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Fitness plan {id}")))?;

        let response: PlanDetailResponse = detail.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/fitness-plans/:id/release - Freeze the plan
    async fn handle_release(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let plan = resources.database.plans().release(id).await?;
        let response: PlanResponse = plan.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/fitness-plans/:id - Delete a plan (cascades)
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        resources.auth.authenticate(&headers).await?;

        let deleted = resources.database.plans().delete(id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Fitness plan {id}")));
        }
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
