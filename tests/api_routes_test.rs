// ABOUTME: End-to-end HTTP tests against the assembled router
// ABOUTME: Registration, plan authoring, join/leave, and the active-plan endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

#![allow(missing_docs, clippy::unwrap_used)]

mod helpers;

use axum::Router;
use cadence_server::config::ServerConfig;
use cadence_server::models::Weekday;
use cadence_server::server::{CadenceServer, ServerResources};
use chrono::Utc;
use helpers::axum_test::AxumTestRequest;
use helpers::test_utils::create_test_db;
use serde_json::{json, Value};
use std::sync::Arc;

async fn test_app() -> Router {
    let database = create_test_db().await;
    let config = ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        environment: cadence_server::config::Environment::Testing,
        log_level: cadence_server::config::LogLevel::Info,
    };
    CadenceServer::router(Arc::new(ServerResources::new(database, config)))
}

async fn register(app: &Router, email: &str) -> String {
    let response = AxumTestRequest::post("/api/users")
        .json(&json!({"email": email, "full_name": "Test User"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json();
    body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let response = AxumTestRequest::get("/health").send(app).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_registration_returns_one_time_token() {
    let app = test_app().await;

    let response = AxumTestRequest::post("/api/users")
        .json(&json!({"email": "new@example.com", "full_name": "New User"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json();
    assert_eq!(body["email"], "new@example.com");
    assert!(!body["token"].as_str().unwrap().is_empty());

    // Bad email is rejected up front
    let response = AxumTestRequest::post("/api/users")
        .json(&json!({"email": "not-an-email", "full_name": "X"}))
        .send(app)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = test_app().await;

    let response = AxumTestRequest::get("/api/workouts").send(app.clone()).await;
    assert_eq!(response.status(), 401);

    let response = AxumTestRequest::get("/api/fitness-plans")
        .bearer("bogus-token")
        .send(app)
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_plan_authoring_flow() {
    let app = test_app().await;
    let token = register(&app, "coach@example.com").await;

    let response = AxumTestRequest::post("/api/workouts")
        .bearer(&token)
        .json(&json!({"name": "Squats", "coach_name": "Coach Carter"}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);
    let workout: Value = response.json();
    let workout_id = workout["id"].as_str().unwrap().to_owned();

    let response = AxumTestRequest::post("/api/fitness-plans")
        .bearer(&token)
        .json(&json!({"name": "Starter", "workouts_per_week": 1}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);
    let plan: Value = response.json();
    let plan_id = plan["id"].as_str().unwrap().to_owned();
    assert_eq!(plan["is_released"], false);

    let response = AxumTestRequest::put(&format!("/api/fitness-plans/{plan_id}/weeks"))
        .bearer(&token)
        .json(&json!({"weeks": [[workout_id], [workout_id]]}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let detail: Value = response.json();
    assert_eq!(detail["weeks"].as_array().unwrap().len(), 2);
    assert_eq!(detail["weeks"][0]["order"], 1);

    let response = AxumTestRequest::post(&format!("/api/fitness-plans/{plan_id}/release"))
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let released: Value = response.json();
    assert_eq!(released["is_released"], true);

    // Frozen after release
    let response = AxumTestRequest::put(&format!("/api/fitness-plans/{plan_id}/weeks"))
        .bearer(&token)
        .json(&json!({"weeks": [[workout_id]]}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 400);

    let response = AxumTestRequest::get("/api/fitness-plans?released_only=true")
        .bearer(&token)
        .send(app)
        .await;
    assert_eq!(response.status(), 200);
    let plans: Value = response.json();
    assert_eq!(plans.as_array().unwrap().len(), 1);
}

/// Build an every-day plan so joining always starts on the request date
async fn seed_daily_plan(app: &Router, token: &str) -> String {
    let response = AxumTestRequest::post("/api/workouts")
        .bearer(token)
        .json(&json!({"name": "Daily Conditioning", "coach_name": null}))
        .send(app.clone())
        .await;
    let workout: Value = response.json();
    let workout_id = workout["id"].as_str().unwrap().to_owned();

    let response = AxumTestRequest::post("/api/fitness-plans")
        .bearer(token)
        .json(&json!({"name": "Every Day", "workouts_per_week": 7}))
        .send(app.clone())
        .await;
    let plan: Value = response.json();
    let plan_id = plan["id"].as_str().unwrap().to_owned();

    let week: Vec<&str> = std::iter::repeat(workout_id.as_str()).take(7).collect();
    AxumTestRequest::put(&format!("/api/fitness-plans/{plan_id}/weeks"))
        .bearer(token)
        .json(&json!({"weeks": [week]}))
        .send(app.clone())
        .await;
    AxumTestRequest::post(&format!("/api/fitness-plans/{plan_id}/release"))
        .bearer(token)
        .send(app.clone())
        .await;

    plan_id
}

#[tokio::test]
async fn test_join_active_view_and_leave_flow() {
    let app = test_app().await;
    let token = register(&app, "athlete@example.com").await;
    let plan_id = seed_daily_plan(&app, &token).await;

    let all_days: Vec<String> = Weekday::ALL.iter().map(ToString::to_string).collect();

    // No active plan yet
    let response = AxumTestRequest::get("/api/fitness-plans/active")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "null");

    let response = AxumTestRequest::post("/api/fitness-plan-participations")
        .bearer(&token)
        .json(&json!({"fitness_plan_id": plan_id, "days": all_days}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);
    let participation: Value = response.json();
    let participation_id = participation["id"].as_str().unwrap().to_owned();
    assert_eq!(participation["is_active"], true);
    // A plan covering every weekday starts the day it is joined
    assert_eq!(
        participation["started_at"],
        Utc::now().date_naive().format("%Y-%m-%d").to_string()
    );

    let response = AxumTestRequest::get("/api/fitness-plans/active")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let view: Value = response.json();
    assert_eq!(view["participation_id"], participation_id);
    assert!(view["todays_workout"].is_object());
    assert!(view["week_status"].is_object());

    // Wrong day count is rejected
    let response = AxumTestRequest::post("/api/fitness-plan-participations")
        .bearer(&token)
        .json(&json!({"fitness_plan_id": plan_id, "days": ["monday"]}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 400);

    // Leave, then attempt to resume
    let response = AxumTestRequest::patch(&format!(
        "/api/fitness-plan-participations/{participation_id}"
    ))
    .bearer(&token)
    .json(&json!({"is_active": false}))
    .send(app.clone())
    .await;
    assert_eq!(response.status(), 200);
    let left: Value = response.json();
    assert_eq!(left["is_active"], false);

    let response = AxumTestRequest::patch(&format!(
        "/api/fitness-plan-participations/{participation_id}"
    ))
    .bearer(&token)
    .json(&json!({"is_active": true}))
    .send(app.clone())
    .await;
    assert_eq!(response.status(), 400);

    let response = AxumTestRequest::get("/api/fitness-plans/active")
        .bearer(&token)
        .send(app)
        .await;
    assert_eq!(response.text(), "null");
}

#[tokio::test]
async fn test_participation_ownership_is_enforced() {
    let app = test_app().await;
    let owner_token = register(&app, "owner@example.com").await;
    let other_token = register(&app, "other@example.com").await;
    let plan_id = seed_daily_plan(&app, &owner_token).await;

    let all_days: Vec<String> = Weekday::ALL.iter().map(ToString::to_string).collect();
    let response = AxumTestRequest::post("/api/fitness-plan-participations")
        .bearer(&owner_token)
        .json(&json!({"fitness_plan_id": plan_id, "days": all_days}))
        .send(app.clone())
        .await;
    let participation: Value = response.json();
    let participation_id = participation["id"].as_str().unwrap();

    let response = AxumTestRequest::patch(&format!(
        "/api/fitness-plan-participations/{participation_id}"
    ))
    .bearer(&other_token)
    .json(&json!({"is_active": false}))
    .send(app)
    .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_complete_workout_endpoint() {
    let app = test_app().await;
    let token = register(&app, "doer@example.com").await;

    let response = AxumTestRequest::post("/api/workouts")
        .bearer(&token)
        .json(&json!({"name": "Stretching", "coach_name": null}))
        .send(app.clone())
        .await;
    let workout: Value = response.json();
    let workout_id = workout["id"].as_str().unwrap().to_owned();

    // No schedule: recorded as an ad-hoc completion
    let response = AxumTestRequest::post("/api/user-workouts")
        .bearer(&token)
        .json(&json!({"workout_id": workout_id}))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 201);
    let occurrence: Value = response.json();
    assert!(occurrence["participation_id"].is_null());
    assert!(occurrence["completed_at"].is_string());

    // Unknown workout
    let response = AxumTestRequest::post("/api/user-workouts")
        .bearer(&token)
        .json(&json!({"workout_id": uuid::Uuid::new_v4()}))
        .send(app)
        .await;
    assert_eq!(response.status(), 404);
}
