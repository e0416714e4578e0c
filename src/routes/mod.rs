// ABOUTME: HTTP route handlers for the Cadence REST API
// ABOUTME: One module per resource, assembled into a single router in server.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! REST route handlers
//!
//! Each resource gets a `*Routes` type exposing a `router()` constructor;
//! `crate::server` merges them and attaches middleware.

pub mod health;
pub mod participations;
pub mod plans;
pub mod users;
pub mod workouts;
