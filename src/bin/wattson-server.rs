// ABOUTME: Server binary wiring configuration, logging, collaborators, and the HTTP router
// ABOUTME: Production entry point for the Wattson conversational query service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Wattson Server Binary
//!
//! Starts the conversational energy-telemetry query service: loads
//! environment configuration, connects the database pool, builds the LLM
//! provider, and serves the HTTP boundary.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use wattson::{
    config::ServerConfig,
    database::PgQueryExecutor,
    llm::{GeminiProvider, LlmProvider},
    logging,
    resources::ServerResources,
    routes,
};

#[derive(Parser)]
#[command(name = "wattson-server")]
#[command(about = "Wattson - conversational AI query service for energy telemetry")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle container environments where clap may not work properly
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using default configuration");
            Args { http_port: None }
        }
    };

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting Wattson Energy Agent");
    info!("{}", config.summary());

    // Connect the database pool
    let executor =
        PgQueryExecutor::connect(&config.database.url, config.database.max_connections).await?;
    info!("Database pool connected");

    // Build the LLM provider
    let provider: Arc<dyn LlmProvider> =
        Arc::new(GeminiProvider::from_env()?.with_default_model(config.llm.model.clone()));
    info!("LLM provider initialized: {}", provider.name());

    // Wire shared resources and the router
    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(executor, provider, Arc::clone(&config)));
    let app = routes::router(resources);

    display_available_endpoints(config.http_port);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!("Server listening on port {}", config.http_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Resolve when the process receives a termination signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

/// Display all available API endpoints
fn display_available_endpoints(port: u16) {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

    info!("=== Available API Endpoints ===");
    info!("Conversation:");
    info!("   Ask a Question:    POST   http://{host}:{port}/ask");
    info!("   Clear a Session:   DELETE http://{host}:{port}/sessions/{{house_id}}");
    info!("Monitoring:");
    info!("   Running Banner:    GET    http://{host}:{port}/");
    info!("   Health Check:      GET    http://{host}:{port}/health");
    info!("=== End of Endpoint List ===");
}
