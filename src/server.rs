// ABOUTME: HTTP server assembly - shared resources and router wiring
// ABOUTME: Owns the axum router that mounts every route group over one resource set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::routes::{
    health::HealthRoutes, participations::ParticipationsRoutes, plans::PlansRoutes,
    users::UsersRoutes, workouts::WorkoutsRoutes,
};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Centralized dependency container shared by all route handlers.
///
/// Everything is created once at startup and cloned by `Arc`, so handlers
/// never construct their own database connections or auth state.
pub struct ServerResources {
    pub database: Database,
    pub auth: AuthManager,
    pub config: ServerConfig,
}

impl ServerResources {
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let auth = AuthManager::new(database.users());
        Self {
            database,
            auth,
            config,
        }
    }
}

/// The Cadence HTTP server
pub struct CadenceServer {
    resources: Arc<ServerResources>,
}

impl CadenceServer {
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Build the full application router with all route groups mounted
    #[must_use]
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .merge(HealthRoutes::router(resources.clone()))
            .merge(UsersRoutes::router(resources.clone()))
            .merge(WorkoutsRoutes::router(resources.clone()))
            .merge(PlansRoutes::router(resources.clone()))
            .merge(ParticipationsRoutes::router(resources))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured port and serve until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the server loop fails.
    pub async fn run(self) -> AppResult<()> {
        let port = self.resources.config.http_port;
        let app = Self::router(self.resources);

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| AppError::config(format!("Failed to bind port {port}: {e}")))?;

        info!("HTTP server listening on http://0.0.0.0:{port}");
        axum::serve(listener, app)
            .await
            .map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;

        Ok(())
    }
}
