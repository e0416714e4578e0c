// ABOUTME: Route handlers for joining and leaving fitness plans
// ABOUTME: Join schedules the full occurrence set; PATCH applies the explicit is_active patch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::database::participations::Participation;
use crate::errors::AppError;
use crate::models::Weekday;
use crate::server::ServerResources;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Response for a participation
#[derive(Debug, Serialize, Deserialize)]
pub struct ParticipationResponse {
    pub id: String,
    pub fitness_plan_id: String,
    /// Date of the first scheduled occurrence
    pub started_at: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<Participation> for ParticipationResponse {
    fn from(participation: Participation) -> Self {
        Self {
            id: participation.id.to_string(),
            fitness_plan_id: participation.fitness_plan_id.to_string(),
            started_at: participation.started_at.format("%Y-%m-%d").to_string(),
            is_active: participation.is_active,
            created_at: participation.created_at.to_rfc3339(),
        }
    }
}

/// Request body for joining a plan
#[derive(Debug, Deserialize)]
pub struct JoinPlanBody {
    pub fitness_plan_id: Uuid,
    /// Chosen weekdays; duplicates collapse, cardinality must match the
    /// plan's workouts-per-week
    pub days: BTreeSet<Weekday>,
}

/// Explicit patch for a participation; only present fields are applied
#[derive(Debug, Deserialize)]
pub struct UpdateParticipationBody {
    /// `false` leaves the plan; `true` on an inactive row is the
    /// rejected resume attempt
    pub is_active: Option<bool>,
}

/// Participations routes handler
pub struct ParticipationsRoutes;

impl ParticipationsRoutes {
    /// Create all participation routes
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/fitness-plan-participations", post(Self::handle_join))
            .route(
                "/api/fitness-plan-participations/:id",
                patch(Self::handle_update),
            )
            .with_state(resources)
    }

    /// Handle POST /api/fitness-plan-participations - Join a fitness plan
    async fn handle_join(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<JoinPlanBody>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate(&headers).await?;

        let participation = resources
            .database
            .participations()
            .join(
                auth.user_id,
                body.fitness_plan_id,
                &body.days,
                Utc::now().date_naive(),
            )
            .await?;

        tracing::info!(
            user_id = %auth.user_id,
            plan_id = %body.fitness_plan_id,
            started_at = %participation.started_at,
            "user joined fitness plan"
        );

        let response: ParticipationResponse = participation.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /api/fitness-plan-participations/:id - Update a participation
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(body): Json<UpdateParticipationBody>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth.authenticate(&headers).await?;
        let manager = resources.database.participations();

        let participation = manager
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Participation {id}")))?;

        if participation.user_id != auth.user_id {
            return Err(AppError::forbidden().with_user_id(auth.user_id));
        }

        let updated = match body.is_active {
            // Absent field: no-op patch, return the current row
            None => participation,
            Some(true) => {
                if participation.is_active {
                    participation
                } else {
                    return Err(AppError::invalid_transition(
                        "You can't resume a fitness plan after leaving",
                    ));
                }
            }
            Some(false) => manager.leave(id, Utc::now().date_naive()).await?,
        };

        let response: ParticipationResponse = updated.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
