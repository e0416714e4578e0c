// ABOUTME: Database operations for users and their API tokens
// ABOUTME: Handles registration, lookup, and token issue/verify with hashed storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use crate::errors::{AppError, AppResult};
use crate::models::User;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Request to register a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    /// Email address (unique)
    pub email: String,
    /// Display name
    pub full_name: String,
}

/// A freshly issued API token; the plaintext is only available here
#[derive(Debug)]
pub struct IssuedToken {
    /// Token to hand to the client, never stored
    pub token: String,
    /// Owning user
    pub user_id: Uuid,
}

/// User database operations manager
pub struct UsersManager {
    pool: SqlitePool,
}

impl UsersManager {
    /// Create a new users manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hex-encoded sha256 of a token, the only form kept at rest
    fn hash_token(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// Returns a conflict error when the email is already registered
    pub async fn create(&self, request: &CreateUserRequest) -> AppResult<User> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO users (id, email, full_name, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id.to_string())
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            email: request.email.clone(),
            full_name: request.full_name.clone(),
            created_at: now,
        })
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, full_name, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Issue a new API token for a user
    ///
    /// The returned plaintext token is shown to the client once; only its
    /// sha256 hash is stored.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown user
    pub async fn issue_token(&self, user_id: Uuid) -> AppResult<IssuedToken> {
        if self.get(user_id).await?.is_none() {
            return Err(AppError::not_found(format!("User {user_id}")));
        }

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        sqlx::query(
            r"
            INSERT INTO user_tokens (id, user_id, token_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(Self::hash_token(&token))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(IssuedToken { token, user_id })
    }

    /// Resolve a bearer token to its owning user, if the token is known
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn user_for_token(&self, token: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT u.id, u.email, u.full_name, u.created_at
            FROM users u
            JOIN user_tokens t ON t.user_id = u.id
            WHERE t.token_hash = $1
            ",
        )
        .bind(Self::hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Revoke all tokens for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn revoke_tokens(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Convert a database row to a `User`
fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id_str: String = row.get("id");
    let created_at_str: String = row.get("created_at");

    Ok(User {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))?,
        email: row.get("email"),
        full_name: row.get("full_name"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))?
            .with_timezone(&Utc),
    })
}
