// ABOUTME: Bearer token authentication for API requests
// ABOUTME: Resolves Authorization headers to the owning user via hashed token lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! Request authentication
//!
//! Clients authenticate with `Authorization: Bearer <token>`, where the
//! token was issued at registration. Tokens are stored as sha256 hashes;
//! the middleware resolves the header to an [`AuthResult`] identity that
//! handlers consume. Session and OAuth machinery is out of scope.

use crate::database::users::UsersManager;
use crate::errors::{AppError, AppResult};
use axum::http::HeaderMap;
use uuid::Uuid;

/// Authenticated user identity for a request
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The authenticated user
    pub user_id: Uuid,
    /// Email of the authenticated user
    pub email: String,
}

/// Authentication manager resolving bearer tokens to users
pub struct AuthManager {
    users: UsersManager,
}

impl AuthManager {
    /// Create a new auth manager
    #[must_use]
    pub const fn new(users: UsersManager) -> Self {
        Self { users }
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns an auth error when the header is missing, malformed, or
    /// the token is unknown
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let auth_header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::auth_required)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Malformed authorization header"))?;

        let user = self
            .users
            .user_for_token(token)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Unknown or revoked token"))?;

        Ok(AuthResult {
            user_id: user.id,
            email: user.email,
        })
    }
}
