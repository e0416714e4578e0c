// ABOUTME: Main library entry point for the Cadence fitness coaching API
// ABOUTME: REST backend for fitness plans, scheduled participations, and workout tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

#![deny(unsafe_code)]

//! # Cadence Server
//!
//! A REST backend for a fitness coaching marketplace. Coaches author
//! multi-week fitness plans; users join a plan by choosing their
//! workout weekdays, and the server schedules every planned occurrence
//! up front from those choices.
//!
//! ## Features
//!
//! - **Plan authoring**: Draft plans with ordered weeks of workouts,
//!   frozen once released
//! - **Participation scheduling**: Joining a plan computes the start
//!   date and full occurrence calendar from the chosen weekdays
//! - **One active plan**: At most one active participation per user,
//!   enforced at the storage layer
//! - **Workout tracking**: Planned occurrences are completed in place;
//!   unscheduled sessions are recorded ad hoc
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_server::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Cadence server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the server binary (src/bin/) and integration
// tests (tests/). They must remain `pub` so external consumers can access them.

/// Bearer token authentication for API requests
pub mod auth;

/// Environment-based server configuration
pub mod config;

/// Database management and per-resource managers
pub mod database;

/// Structured error types with `HTTP` status mapping
pub mod errors;

/// Structured logging initialization
pub mod logging;

/// Common domain types shared across layers
pub mod models;

/// `HTTP` route handlers grouped per resource
pub mod routes;

/// Weekday cycle scheduling for plan participations
pub mod schedule;

/// Server resource wiring and the `HTTP` serve loop
pub mod server;
