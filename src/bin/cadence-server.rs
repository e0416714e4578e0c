// ABOUTME: Server binary for the Cadence fitness coaching API
// ABOUTME: Loads configuration, connects the database, and runs the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence Fitness

//! # Cadence Server Binary
//!
//! Starts the Cadence REST API with bearer token authentication and
//! `SQLite`-backed storage.

use anyhow::Result;
use cadence_server::{
    config::ServerConfig,
    database::Database,
    logging,
    server::{CadenceServer, ServerResources},
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "cadence-server")]
#[command(about = "Cadence - fitness coaching marketplace API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting Cadence fitness API");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;
    info!("Database initialized: {}", config.database_url);

    let resources = Arc::new(ServerResources::new(database, config));
    let server = CadenceServer::new(resources);

    server.run().await?;

    Ok(())
}
