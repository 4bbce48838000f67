// ABOUTME: Conversation façade composing transcripts with new questions and recording turns
// ABOUTME: This boundary never raises; every failure becomes a plain-language apology
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Conversation Service
//!
//! The request-handling façade. Per request: look up the tenant's prior
//! transcript, compose it with the new question and a dated situational
//! header, delegate to the orchestrator, convert any failure into an
//! apology string, and record the turn back into the session store under
//! the tenant's original (un-augmented) question.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

use crate::llm::prompts;
use crate::session::{TenantSessionStore, TranscriptEntry};

use super::QuestionAnswerer;

/// Fixed user-facing apology. Technical failure detail is logged, never
/// surfaced: the consumer of this string is a non-technical end user.
const APOLOGY: &str =
    "Sorry, I ran into a problem while processing your request. Please try rephrasing your question.";

/// Stateless-per-call conversation façade over the session store and the
/// orchestration collaborator
pub struct ConversationService {
    sessions: TenantSessionStore,
    answerer: Arc<dyn QuestionAnswerer>,
}

impl ConversationService {
    /// Create a service over a session store and an answerer
    #[must_use]
    pub fn new(sessions: TenantSessionStore, answerer: Arc<dyn QuestionAnswerer>) -> Self {
        Self { sessions, answerer }
    }

    /// Handle one conversation turn. Never fails: all errors become the
    /// apology string and the HTTP boundary observes a normal response.
    pub async fn handle(&self, question: &str, tenant: Option<&str>) -> String {
        let tenant = tenant.filter(|t| !t.is_empty());

        let history = tenant.map_or_else(Vec::new, |t| self.sessions.history(t));
        info!(
            tenant = tenant.unwrap_or("<unrestricted>"),
            history_len = history.len(),
            "Handling conversation turn"
        );

        let composed = Self::compose_input(question, &history, Utc::now());

        let answer = match self.answerer.respond(&composed, tenant).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Conversation turn failed");
                APOLOGY.to_owned()
            }
        };

        if let Some(tenant) = tenant {
            self.sessions.record_turn(tenant, question, answer.as_str());
        }

        answer
    }

    /// Access the session store (for explicit clearing)
    #[must_use]
    pub const fn sessions(&self) -> &TenantSessionStore {
        &self.sessions
    }

    /// Compose the orchestrator input: situational header, then the replayed
    /// transcript when non-empty, then the current question.
    #[must_use]
    pub fn compose_input(
        question: &str,
        history: &[TranscriptEntry],
        now: DateTime<Utc>,
    ) -> String {
        let header = prompts::situational_header(now);

        if history.is_empty() {
            return format!("{header}{question}");
        }

        let mut composed = header;
        for entry in history {
            composed.push_str(&prompts::format_history_turn(&entry.question, &entry.answer));
        }
        composed.push_str(&format!("Current Question: {question}"));
        composed
    }
}
