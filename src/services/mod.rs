// ABOUTME: Domain service layer between the HTTP boundary and the mediation core
// ABOUTME: Conversation handling and the LLM tool-execution loop live here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

/// Conversation façade: history composition, delegation, transcript recording
pub mod conversation;

/// Multi-turn LLM function-calling loop over the database tools
pub mod orchestrator;

pub use conversation::ConversationService;
pub use orchestrator::{AgentOrchestrator, QuestionAnswerer};
