// ABOUTME: Conversational query endpoint and tenant session management routes
// ABOUTME: POST /ask always answers with a 200 success envelope; failures live in the text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! Conversational query routes
//!
//! `POST /ask` is the primary boundary: a question plus an optional
//! `house_id` naming the tenant partition the caller may see. An absent
//! `house_id` means an unrestricted/administrative caller. The endpoint
//! never returns an error envelope - the conversation service converts
//! every failure into a plain-language answer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::resources::ServerResources;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Inbound conversational query
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The natural-language question
    pub query: String,
    /// Tenant partition the caller is authorized to see; absent means
    /// unrestricted
    #[serde(default)]
    pub house_id: Option<String>,
}

/// Conversational response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The question as received
    pub query: String,
    /// The produced answer text
    pub response: String,
}

// ============================================================================
// Ask Routes
// ============================================================================

/// Conversational query routes handler
pub struct AskRoutes;

impl AskRoutes {
    /// Create the query and session management routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ask", post(Self::ask))
            .route("/sessions/:house_id", delete(Self::clear_session))
            .with_state(resources)
    }

    /// Handle one conversational query
    async fn ask(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<QueryRequest>,
    ) -> Json<QueryResponse> {
        info!(
            house_id = request.house_id.as_deref().unwrap_or("<unrestricted>"),
            "Received query"
        );

        let response = resources
            .conversation
            .handle(&request.query, request.house_id.as_deref())
            .await;

        Json(QueryResponse {
            query: request.query,
            response,
        })
    }

    /// Explicitly destroy a tenant's conversation session.
    ///
    /// Idempotent: clearing an absent session is still a 204.
    async fn clear_session(
        State(resources): State<Arc<ServerResources>>,
        Path(house_id): Path<String>,
    ) -> StatusCode {
        resources.conversation.sessions().clear(&house_id);
        StatusCode::NO_CONTENT
    }
}
