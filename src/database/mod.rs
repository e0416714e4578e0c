// ABOUTME: Database management for the Cadence fitness API
// ABOUTME: SQLite pool wrapper, schema migrations, and per-resource managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! # Database Management
//!
//! One [`Database`] wraps the `SQLite` pool, runs migrations at startup,
//! and hands out per-resource managers (users, workouts, plans,
//! participations) in the same style throughout.

pub mod participations;
pub mod plans;
pub mod users;
pub mod workouts;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

use participations::ParticipationsManager;
use plans::PlansManager;
use users::UsersManager;
use workouts::WorkoutsManager;

/// Database manager wrapping the connection pool
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains("::memory:")
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Users and API token manager
    #[must_use]
    pub fn users(&self) -> UsersManager {
        UsersManager::new(self.pool.clone())
    }

    /// Workouts manager
    #[must_use]
    pub fn workouts(&self) -> WorkoutsManager {
        WorkoutsManager::new(self.pool.clone())
    }

    /// Fitness plan templates manager
    #[must_use]
    pub fn plans(&self) -> PlansManager {
        PlansManager::new(self.pool.clone())
    }

    /// Participations and planned occurrences manager
    #[must_use]
    pub fn participations(&self) -> ParticipationsManager {
        ParticipationsManager::new(self.pool.clone())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;

        self.migrate_users().await?;
        self.migrate_workouts().await?;
        self.migrate_plans().await?;
        self.migrate_participations().await?;

        Ok(())
    }

    async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_workouts(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                coach_name TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_plans(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fitness_plans (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                workouts_per_week INTEGER NOT NULL CHECK (workouts_per_week > 0),
                is_released INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fitness_plan_weeks (
                id TEXT PRIMARY KEY,
                fitness_plan_id TEXT NOT NULL REFERENCES fitness_plans(id) ON DELETE CASCADE,
                week_order INTEGER NOT NULL,
                UNIQUE (fitness_plan_id, week_order)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fitness_plan_week_workouts (
                id TEXT PRIMARY KEY,
                fitness_plan_week_id TEXT NOT NULL
                    REFERENCES fitness_plan_weeks(id) ON DELETE CASCADE,
                workout_id TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                workout_order INTEGER NOT NULL,
                UNIQUE (fitness_plan_week_id, workout_order)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_participations(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fitness_plan_participations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                fitness_plan_id TEXT NOT NULL REFERENCES fitness_plans(id),
                started_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // The at-most-one-active invariant lives at the storage layer so
        // concurrent double-joins serialize or fail instead of producing
        // two active rows
        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_participations_one_active_per_user
            ON fitness_plan_participations(user_id) WHERE is_active = 1
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_workouts (
                id TEXT PRIMARY KEY,
                workout_id TEXT NOT NULL REFERENCES workouts(id),
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                participation_id TEXT
                    REFERENCES fitness_plan_participations(id) ON DELETE CASCADE,
                started_at TEXT NOT NULL,
                completed_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_user_workouts_participation
            ON user_workouts(participation_id, started_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
