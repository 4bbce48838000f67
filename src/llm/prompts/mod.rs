// ABOUTME: Prompt templates for SQL generation, schema overviews, and the assistant system prompt
// ABOUTME: The system prompt is loaded at compile time from a markdown file for easy maintenance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Prompt Templates
//!
//! All text injected into LLM prompts lives here: the assistant system
//! prompt, the secure SQL-generation templates (with and without a tenant
//! isolation directive), the schema overview, and the situational header
//! prepended to every conversation turn.

use chrono::{DateTime, Utc};

use crate::constants::database::TENANT_COLUMN;

/// Wattson assistant system prompt with tool definitions and guidelines
pub const WATTSON_SYSTEM_PROMPT: &str = include_str!("wattson_system.md");

/// Get the system prompt for the Wattson energy assistant
///
/// This is the default system prompt used for every conversation turn. It
/// instructs the model to touch tools only when database data is required.
#[must_use]
pub const fn get_wattson_system_prompt() -> &'static str {
    WATTSON_SYSTEM_PROMPT
}

/// Build the SQL-generation prompt for a question.
///
/// When a tenant is present the prompt carries an explicit isolation
/// directive; the mediator additionally enforces the predicate
/// syntactically, so this directive is guidance, not the guarantee.
#[must_use]
pub fn secure_generation_prompt(question: &str, schema_info: &str, tenant: Option<&str>) -> String {
    match tenant {
        Some(tenant) => format!(
            "Context: You have access to a database with the following schema:\n\
             {schema_info}\n\n\
             Note: Energy values are in Watts.\n\n\
             User Request: {question}\n\n\
             CRITICAL SECURITY REQUIREMENT: Only return data for {TENANT_COLUMN}='{tenant}'.\n\
             You MUST include WHERE {TENANT_COLUMN}='{tenant}' in your SQL queries.\n\
             Generate appropriate SQL SELECT queries based on the schema above."
        ),
        None => format!(
            "Context: You have access to a database with the following schema:\n\
             {schema_info}\n\n\
             Note: Energy values are in Watts.\n\n\
             User Request: {question}\n\n\
             Generate appropriate SQL SELECT queries based on the schema above."
        ),
    }
}

/// Build the schema overview text handed to the model by `check_database_schema`
#[must_use]
pub fn schema_overview(schema_info: &str) -> String {
    format!(
        "Database Schema Overview:\n\n\
         {schema_info}\n\n\
         Key Information:\n\
         - Energy values are measured in Watts\n\
         - Use proper table and column names from the schema above\n\
         - Only SELECT queries are allowed for security\n\
         - When {TENANT_COLUMN} is specified, ALL queries must include the {TENANT_COLUMN} filter\n\
         - Available tables include energy_readings, devices, houses, users, etc."
    )
}

/// Tenant security instructions appended to the system prompt when a tenant
/// is present on the request
#[must_use]
pub fn tenant_security_instructions(tenant: &str) -> String {
    format!(
        "7. CRITICAL SECURITY: Only show data for {TENANT_COLUMN}='{tenant}'\n\
         8. MANDATORY: Every SQL query MUST include WHERE {TENANT_COLUMN}='{tenant}'\n\
         9. Failure to include the {TENANT_COLUMN} filter will result in a security violation"
    )
}

/// Situational header prepended to every composed conversation turn.
///
/// Carries today's date and the current time so relative questions
/// ("today", "this morning") resolve correctly, plus the instruction to
/// avoid database access when none is needed.
#[must_use]
pub fn situational_header(now: DateTime<Utc>) -> String {
    format!(
        "CONTEXT: Today's date is {} and current time is {}.\n\
         IMPORTANT: If you can answer this question without needing any external data from the \
         database, do NOT use any database tools. Only access the database if you specifically \
         need energy data, device information, or consumption statistics.\n\n",
        now.format("%Y-%m-%d"),
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Format one prior turn for transcript replay
#[must_use]
pub fn format_history_turn(question: &str, answer: &str) -> String {
    format!("Previous Q: {question}\nPrevious A: {answer}\n\n")
}
