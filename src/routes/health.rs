// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Provides the running banner and a liveness endpoint for infrastructure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! Health check routes for service monitoring

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the banner and health check routes
    pub fn routes() -> axum::Router {
        use axum::{routing::get, Json, Router};

        async fn root_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "message": "Wattson Energy Agent is running!"
            }))
        }

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
    }
}
