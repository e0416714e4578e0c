// ABOUTME: Database seeding utilities for integration tests
// ABOUTME: In-memory database setup plus users, workouts, and plan fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

use cadence_server::database::plans::CreatePlanRequest;
use cadence_server::database::users::CreateUserRequest;
use cadence_server::database::workouts::CreateWorkoutRequest;
use cadence_server::database::Database;
use cadence_server::models::{User, Workout};
use uuid::Uuid;

/// Create an in-memory test database with the full schema migrated
pub async fn create_test_db() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

/// Create a test user with a unique email
pub async fn seed_user(db: &Database, email: &str) -> User {
    db.users()
        .create(&CreateUserRequest {
            email: email.to_owned(),
            full_name: "Test User".to_owned(),
        })
        .await
        .expect("Failed to create test user")
}

/// Create a named workout
pub async fn seed_workout(db: &Database, name: &str) -> Workout {
    db.workouts()
        .create(&CreateWorkoutRequest {
            name: name.to_owned(),
            coach_name: Some("Coach Carter".to_owned()),
        })
        .await
        .expect("Failed to create test workout")
}

/// Create a plan with the given weekly cadence and week contents, released
///
/// Each inner slice is one week's ordered workout ids.
pub async fn seed_released_plan(
    db: &Database,
    workouts_per_week: u32,
    weeks: &[Vec<Uuid>],
) -> Uuid {
    let plan = db
        .plans()
        .create(&CreatePlanRequest {
            name: "Test Plan".to_owned(),
            workouts_per_week,
        })
        .await
        .expect("Failed to create test plan");

    db.plans()
        .replace_weeks(plan.id, weeks)
        .await
        .expect("Failed to set plan weeks");
    db.plans()
        .release(plan.id)
        .await
        .expect("Failed to release test plan");

    plan.id
}
