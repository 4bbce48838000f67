// ABOUTME: Query mediation layer enforcing read-only and tenant-isolation constraints
// ABOUTME: Every model-generated statement passes through here before execution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Query Mediator
//!
//! The security boundary between the SQL-generation collaborator and the
//! database. The mediator composes the generation prompt, cleans the
//! generated statement, rejects anything that is not a read-only selection,
//! unconditionally rewrites the tenant predicate into tenant-scoped
//! statements, executes, and normalizes the result.
//!
//! Collaborators are held behind traits ([`SqlGenerator`], [`QueryExecutor`])
//! so tests can substitute deterministic fakes and the security properties
//! can be asserted without a model or a database.

pub mod sql_guard;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::llm::{prompts, ChatMessage, ChatRequest, LlmProvider};
use crate::constants::llm::SQL_GENERATION_TEMPERATURE;

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Natural-language-to-SQL generation collaborator
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Produce candidate SQL text for a composed generation prompt
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

/// Database execution collaborator
///
/// Returns result rows as JSON objects keyed by column name.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a SQL statement and return its rows
    async fn execute(&self, sql: &str) -> AppResult<Vec<Map<String, Value>>>;
}

/// [`SqlGenerator`] backed by an LLM chat provider.
///
/// Generation runs at temperature zero; SQL output should be deterministic.
pub struct LlmSqlGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl LlmSqlGenerator {
    /// Create a generator over a chat provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SqlGenerator for LlmSqlGenerator {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(SQL_GENERATION_TEMPERATURE);
        let response = self.provider.complete(&request).await?;
        Ok(response.content)
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Normalized outcome of an executed statement.
///
/// Callers must be able to tell "ran fine, nothing found" apart from every
/// other state, so the empty result set is an explicit variant rather than
/// an empty row collection.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Statement executed successfully but produced an empty result set
    NoData,
    /// A singleton scalar result, collapsed to its bare value
    Scalar(Value),
    /// Multi-row or multi-column results as a literal row collection
    Rows(Vec<Map<String, Value>>),
}

impl QueryOutcome {
    /// True when the statement ran but found nothing
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// Result of a mediated query, produced fresh per call
#[derive(Debug, Clone)]
pub struct MediatedResult {
    /// The SQL text that was actually executed
    pub statement: String,
    /// Normalized result payload
    pub outcome: QueryOutcome,
    /// Whether a tenant predicate was enforced into the statement
    pub tenant_enforced: bool,
}

/// Typed failure taxonomy for mediation.
///
/// `NoData` is deliberately absent: an empty result set is a successful
/// [`QueryOutcome`], not an error.
#[derive(Debug, Error)]
pub enum MediationError {
    /// Generated statement is not a read-only selection; never executed
    #[error("generated statement is not a read-only selection")]
    Forbidden {
        /// The offending statement text
        statement: String,
    },

    /// The generation collaborator errored, timed out, or was rate limited
    #[error("SQL generation failed")]
    GenerationFailed {
        /// Underlying collaborator error
        #[source]
        source: AppError,
    },

    /// The database collaborator rejected or failed to run the statement
    #[error("query execution failed")]
    ExecutionFailed {
        /// Underlying collaborator error
        #[source]
        source: AppError,
    },
}

// ============================================================================
// Mediator
// ============================================================================

/// Mediates every natural-language query against the database.
///
/// The generator is an untrusted collaborator: its output is treated as
/// attacker-influenced text because the triggering question may itself be
/// adversarial. Validation is syntactic defense-in-depth, not a SQL parser.
pub struct QueryMediator {
    generator: Arc<dyn SqlGenerator>,
    executor: Arc<dyn QueryExecutor>,
}

impl QueryMediator {
    /// Create a mediator over its two collaborators
    #[must_use]
    pub fn new(generator: Arc<dyn SqlGenerator>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            generator,
            executor,
        }
    }

    /// Answer a question by generating, validating, and executing SQL.
    ///
    /// When `tenant` is present, the final executed statement always carries
    /// a tenant predicate - physically present in the statement text - even
    /// if the generator appeared to include one.
    ///
    /// # Errors
    ///
    /// Returns [`MediationError::Forbidden`] for non-SELECT statements,
    /// [`MediationError::GenerationFailed`] when the generator fails, and
    /// [`MediationError::ExecutionFailed`] when execution fails. Raw
    /// collaborator errors never escape unclassified.
    pub async fn answer(
        &self,
        question: &str,
        tenant: Option<&str>,
        schema_context: &str,
    ) -> Result<MediatedResult, MediationError> {
        let prompt = prompts::secure_generation_prompt(question, schema_context, tenant);

        let raw = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|source| MediationError::GenerationFailed { source })?;

        let cleaned = sql_guard::strip_code_fences(&raw);

        if !sql_guard::is_read_only(&cleaned) {
            warn!(statement = %cleaned, "Rejected non-SELECT statement");
            return Err(MediationError::Forbidden { statement: cleaned });
        }

        let (statement, tenant_enforced) = match tenant.filter(|t| !t.is_empty()) {
            Some(tenant) => (sql_guard::enforce_tenant_filter(&cleaned, tenant), true),
            None => (cleaned, false),
        };

        info!(statement = %statement, tenant_enforced, "Executing mediated statement");

        let rows = self
            .executor
            .execute(&statement)
            .await
            .map_err(|source| MediationError::ExecutionFailed { source })?;

        Ok(MediatedResult {
            outcome: Self::normalize(rows),
            statement,
            tenant_enforced,
        })
    }

    /// Normalize raw rows into a [`QueryOutcome`].
    ///
    /// Empty result sets become the explicit no-data marker; a single row
    /// with a single column collapses to its bare value.
    fn normalize(rows: Vec<Map<String, Value>>) -> QueryOutcome {
        if rows.is_empty() {
            return QueryOutcome::NoData;
        }

        if rows.len() == 1 && rows[0].len() == 1 {
            if let Some(value) = rows[0].values().next() {
                return QueryOutcome::Scalar(value.clone());
            }
        }

        QueryOutcome::Rows(rows)
    }
}
