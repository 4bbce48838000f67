// ABOUTME: HTTP router assembly over the route modules
// ABOUTME: Applies tracing, CORS, and request timeout layers around all routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # HTTP Routes
//!
//! Route builders follow one pattern: a unit struct with a `routes()`
//! constructor returning an `axum::Router` wired to [`ServerResources`].

/// Conversational query endpoint and session management
pub mod ask;

/// Health checks and the running banner
pub mod health;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::constants::http::REQUEST_TIMEOUT_SECS;
use crate::resources::ServerResources;

/// Build the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(ask::AskRoutes::routes(resources))
        .merge(health::HealthRoutes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}
