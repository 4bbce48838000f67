// ABOUTME: In-memory tenant session store with per-tenant transcript and timed eviction
// ABOUTME: Each session self-expires after 15 minutes without a recorded turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Tenant Session Store
//!
//! Per-tenant conversation transcripts with self-driven expiry. A session is
//! created on the first recorded turn for a tenant, refreshed on every
//! subsequent turn, and destroyed either by [`TenantSessionStore::clear`] or
//! by its expiry deadline elapsing - whichever comes first.
//!
//! Sessions are process-local and never persisted; a restart drops all
//! conversation history. Entry count per session is unbounded but the store
//! as a whole is bounded by session lifetime (15 minutes of inactivity)
//! times per-tenant traffic rate.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::constants::session::INACTIVITY_WINDOW_SECS;

/// A single question/answer turn in a tenant's transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// The user's original (un-augmented) question
    pub question: String,
    /// The answer produced for that question
    pub answer: String,
    /// When the turn was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Per-tenant session state: ordered transcript plus its expiry bookkeeping.
///
/// The `epoch` counter increments on every (re)schedule. The expiry task
/// captures the epoch it was scheduled with and only removes the session if
/// the epoch still matches when it fires, so a stale timer that lost the
/// reschedule race can never destroy a refreshed session.
struct TenantSession {
    entries: Vec<TranscriptEntry>,
    expires_at: Instant,
    epoch: u64,
    expiry_task: Option<JoinHandle<()>>,
}

impl Drop for TenantSession {
    fn drop(&mut self) {
        if let Some(task) = self.expiry_task.take() {
            task.abort();
        }
    }
}

/// Tenant-scoped conversation cache with timed eviction
///
/// Uses `DashMap` so operations on different tenants never contend on a
/// single global lock; mutations for one tenant serialize on its map entry.
/// Eviction is self-driven via one fire-once tokio task per session,
/// atomically replaced on every reschedule.
#[derive(Clone)]
pub struct TenantSessionStore {
    sessions: Arc<DashMap<String, TenantSession>>,
    window: Duration,
}

impl Default for TenantSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantSessionStore {
    /// Create a store with the production inactivity window (15 minutes)
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(INACTIVITY_WINDOW_SECS))
    }

    /// Create a store with a custom inactivity window
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            window,
        }
    }

    /// Record a question/answer turn for a tenant and reset its expiry.
    ///
    /// Creates the session if absent. Rescheduling cancels the previously
    /// pending expiry; the latest deadline always wins. Recording for an
    /// empty tenant is a no-op - unrestricted callers are not cached.
    pub fn record_turn(&self, tenant: &str, question: impl Into<String>, answer: impl Into<String>) {
        if tenant.is_empty() {
            return;
        }

        let mut session = self
            .sessions
            .entry(tenant.to_owned())
            .or_insert_with(|| TenantSession {
                entries: Vec::new(),
                expires_at: Instant::now() + self.window,
                epoch: 0,
                expiry_task: None,
            });

        // A session idle past its deadline whose timer has not fired yet is
        // already dead; the new turn starts a fresh transcript.
        if Instant::now() >= session.expires_at {
            session.entries.clear();
        }

        session.entries.push(TranscriptEntry {
            question: question.into(),
            answer: answer.into(),
            recorded_at: Utc::now(),
        });

        session.epoch += 1;
        session.expires_at = Instant::now() + self.window;

        // Cancel-and-replace under the entry lock: at most one live timer
        // per tenant at any instant.
        if let Some(previous) = session.expiry_task.take() {
            previous.abort();
        }
        session.expiry_task = Some(self.spawn_expiry(tenant.to_owned(), session.epoch));

        tracing::debug!(
            tenant = %tenant,
            entries = session.entries.len(),
            "Recorded conversation turn"
        );
    }

    /// Get the current transcript for a tenant in insertion order.
    ///
    /// Returns an empty vector if no session exists, including after expiry
    /// or clearing. A session whose deadline has passed but whose timer has
    /// not fired yet is treated as already empty.
    #[must_use]
    pub fn history(&self, tenant: &str) -> Vec<TranscriptEntry> {
        if tenant.is_empty() {
            return Vec::new();
        }

        self.sessions.get(tenant).map_or_else(Vec::new, |session| {
            if Instant::now() >= session.expires_at {
                return Vec::new();
            }
            session.entries.clone()
        })
    }

    /// Destroy a tenant's session and cancel its pending expiry.
    ///
    /// Idempotent: clearing an absent session does nothing.
    pub fn clear(&self, tenant: &str) {
        if self.sessions.remove(tenant).is_some() {
            tracing::debug!(tenant = %tenant, "Cleared conversation session");
        }
        // The removed session's Drop aborts its expiry task.
    }

    /// Number of live sessions, for diagnostics
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Spawn the fire-once expiry task for a (tenant, epoch) pair.
    ///
    /// When it fires, the task removes the session only if no newer turn
    /// rescheduled it in the meantime (epoch match). `remove_if` takes the
    /// entry lock, so the check and the removal are atomic with respect to
    /// concurrent `record_turn` calls.
    fn spawn_expiry(&self, tenant: String, epoch: u64) -> JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        let window = self.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let removed = sessions.remove_if(&tenant, |_, session| session.epoch == epoch);
            if removed.is_some() {
                tracing::debug!(tenant = %tenant, "Session expired after inactivity window");
            }
        })
    }
}
