// ABOUTME: Route handlers for user registration and token issuance
// ABOUTME: Registration returns the one-time plaintext API token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::database::users::CreateUserRequest;
use crate::errors::AppError;
use crate::server::ServerResources;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for registering a user
#[derive(Debug, Deserialize)]
pub struct RegisterUserBody {
    /// Email address (unique)
    pub email: String,
    /// Display name
    pub full_name: String,
}

/// Response for a registered user, including the one-time token
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    /// API token; shown once, only a hash is stored
    pub token: String,
}

/// Users routes handler
pub struct UsersRoutes;

impl UsersRoutes {
    /// Create all user routes
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/users", post(Self::handle_register))
            .with_state(resources)
    }

    /// Handle POST /api/users - Register a user and issue an API token
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<RegisterUserBody>,
    ) -> Result<Response, AppError> {
        if body.email.is_empty() || !body.email.contains('@') {
            return Err(AppError::invalid_input("A valid email address is required"));
        }

        let users = resources.database.users();
        let user = users
            .create(&CreateUserRequest {
                email: body.email,
                full_name: body.full_name,
            })
            .await?;
        let issued = users.issue_token(user.id).await?;

        let response = RegisterUserResponse {
            id: user.id.to_string(),
            email: user.email,
            full_name: user.full_name,
            token: issued.token,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }
}
