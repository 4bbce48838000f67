// ABOUTME: Shared server resources wired once at startup and handed to route builders
// ABOUTME: Owns the collaborator graph: executor, schema catalog, mediator, orchestrator, sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Server Resources
//!
//! Dependency wiring for the server. Construction happens once in the
//! binary; route handlers receive the resources behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::database::{PgQueryExecutor, SchemaCatalog};
use crate::llm::LlmProvider;
use crate::mediator::{LlmSqlGenerator, QueryMediator};
use crate::services::{AgentOrchestrator, ConversationService};
use crate::session::TenantSessionStore;

/// Shared state for all route handlers
pub struct ServerResources {
    /// The conversation façade behind `POST /ask`
    pub conversation: Arc<ConversationService>,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wire the collaborator graph from an executor, a provider, and config
    #[must_use]
    pub fn new(
        executor: PgQueryExecutor,
        provider: Arc<dyn LlmProvider>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let schema = Arc::new(SchemaCatalog::new(
            executor.pool().clone(),
            config.schema_override.clone(),
        ));
        let generator = Arc::new(LlmSqlGenerator::new(Arc::clone(&provider)));
        let mediator = Arc::new(QueryMediator::new(generator, Arc::new(executor)));
        let orchestrator = Arc::new(AgentOrchestrator::new(provider, mediator, schema));

        let sessions = TenantSessionStore::with_window(Duration::from_secs(
            config.session.inactivity_window_secs,
        ));
        let conversation = Arc::new(ConversationService::new(sessions, orchestrator));

        Self {
            conversation,
            config,
        }
    }
}
