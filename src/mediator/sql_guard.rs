// ABOUTME: Syntactic SQL validation and tenant-predicate rewriting for generated statements
// ABOUTME: The sole security-critical transformation in the system; keep every case tested
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # SQL Guard
//!
//! Syntactic checks and rewrites applied to model-generated SQL before it
//! may execute. The generator is treated as adversarial-input-adjacent: its
//! input is the user's question, which may itself be a tenant-impersonation
//! attempt, so the tenant predicate is spliced in unconditionally even when
//! the generated statement already appears to contain one.
//!
//! The checks are keyword/substring heuristics, not a SQL parser. Statements
//! disguised with leading comments or CTE prefixes fail the read-only check
//! and are rejected rather than executed.

use regex::{NoExpand, Regex};
use std::sync::OnceLock;

use crate::constants::database::TENANT_COLUMN;

/// Matches a markdown code fence opener, optionally tagged `sql`
fn fence_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^```(sql)?\s*").expect("valid fence-open regex"))
}

/// Matches a markdown code fence closer at end of text
fn fence_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*```$").expect("valid fence-close regex"))
}

/// Matches the first WHERE keyword
fn where_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bWHERE\b").expect("valid where regex"))
}

/// Matches the first trailing clause a WHERE must precede
fn trailing_clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(GROUP\s+BY|ORDER\s+BY|LIMIT|OFFSET)\b")
            .expect("valid trailing-clause regex")
    })
}

/// Strip decorative markdown code fencing the generator may wrap around a
/// statement, plus surrounding whitespace.
#[must_use]
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_open = fence_open_re().replace(trimmed, "");
    let without_close = fence_close_re().replace(&without_open, "");
    without_close.trim().to_owned()
}

/// Check that a cleaned statement begins with the read-only selection
/// keyword. Mutation and schema-altering statements never pass, regardless
/// of what was requested or generated.
#[must_use]
pub fn is_read_only(statement: &str) -> bool {
    let upper = statement.trim_start().to_uppercase();
    upper.starts_with("SELECT")
}

/// Splice the tenant predicate into a statement.
///
/// Two explicit cases:
/// - The statement already has a filtering clause: the tenant predicate is
///   conjoined into it (`WHERE <tenant> AND <existing>`), never trusted to
///   be present already.
/// - The statement has no filtering clause: one is inserted, before any
///   trailing `GROUP BY`/`ORDER BY`/`LIMIT`/`OFFSET` so the statement stays
///   valid, or appended otherwise.
///
/// Single quotes in the tenant value are doubled so a hostile tenant string
/// cannot break out of the predicate literal. A trailing semicolon is
/// preserved.
#[must_use]
pub fn enforce_tenant_filter(statement: &str, tenant: &str) -> String {
    let trimmed = statement.trim();
    let (body, had_semicolon) = match trimmed.strip_suffix(';') {
        Some(body) => (body.trim_end(), true),
        None => (trimmed, false),
    };

    let escaped = tenant.replace('\'', "''");
    let predicate = format!("{TENANT_COLUMN} = '{escaped}'");

    let rewritten = if where_re().is_match(body) {
        // Conjoin into the existing clause at the first WHERE. NoExpand so a
        // hostile tenant value cannot smuggle capture-group references.
        let replacement = format!("WHERE {predicate} AND");
        where_re()
            .replacen(body, 1, NoExpand(&replacement))
            .into_owned()
    } else if let Some(m) = trailing_clause_re().find(body) {
        let (head, tail) = body.split_at(m.start());
        format!("{}WHERE {predicate} {}", head, tail)
    } else {
        format!("{body} WHERE {predicate}")
    };

    if had_semicolon {
        format!("{rewritten};")
    } else {
        rewritten
    }
}
