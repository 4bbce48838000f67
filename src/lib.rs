// ABOUTME: Main library entry point for the Wattson energy telemetry query service
// ABOUTME: Conversational NL-to-SQL answering with per-tenant sessions and query mediation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

#![deny(unsafe_code)]

//! # Wattson
//!
//! A conversational query service that answers natural-language questions
//! against a multi-tenant energy-telemetry database by delegating SQL
//! translation to a hosted language model.
//!
//! ## Features
//!
//! - **Per-tenant conversation memory**: recent question/answer turns are
//!   cached per `house_id` and expire after 15 minutes of inactivity
//! - **Query mediation**: every model-generated statement is validated as
//!   read-only and rewritten to carry the caller's tenant predicate before
//!   execution
//! - **Tool-driven orchestration**: the model decides per turn whether
//!   database access is needed at all
//! - **Always-200 boundary**: failures reach the end user as plain-language
//!   text, never as error envelopes or raw technical detail
//!
//! ## Architecture
//!
//! The server follows a modular architecture:
//! - **Session**: tenant-scoped transcript store with timed eviction
//! - **Mediator**: the security boundary between generated SQL and the database
//! - **Services**: conversation façade and the LLM tool-execution loop
//! - **LLM**: provider abstraction with the Gemini implementation
//! - **Database**: sqlx PostgreSQL execution and schema-context provision
//! - **Routes**: axum HTTP boundary
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use wattson::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load configuration from the environment
//!     let config = ServerConfig::from_env()?;
//!     println!("Wattson configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Application constants and default configuration values
pub mod constants;

/// PostgreSQL query execution and schema-context provision
pub mod database;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// LLM provider abstraction for AI chat integration
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Query mediation: read-only validation and tenant-isolation enforcement
pub mod mediator;

/// Shared server resources handed to route builders
pub mod resources;

/// `HTTP` routes for the conversational query boundary
pub mod routes;

/// Domain service layer: conversation façade and tool orchestration
pub mod services;

/// Tenant session store with timed eviction
pub mod session;

/// Function-calling tools exposed to the conversation loop
pub mod tools;
