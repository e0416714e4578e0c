// ABOUTME: Liveness endpoint for load balancers and uptime checks
// ABOUTME: Reports service name, version, and database reachability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::errors::AppError;
use crate::server::ServerResources;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    /// Handle GET /health
    async fn handle_health(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<HealthResponse>, AppError> {
        // A trivial query verifies the pool is usable
        sqlx::query("SELECT 1")
            .execute(resources.database.pool())
            .await?;

        Ok(Json(HealthResponse {
            status: "ok".to_owned(),
            service: "cadence-server".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            timestamp: Utc::now().to_rfc3339(),
        }))
    }
}
