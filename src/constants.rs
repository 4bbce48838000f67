// ABOUTME: Application constants and default configuration values
// ABOUTME: Central place for tunables referenced from config, session, and mediation code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

/// Session store defaults
pub mod session {
    /// Inactivity window after which an idle tenant session is destroyed.
    ///
    /// 900 seconds = 15 minutes of no recorded turns.
    pub const INACTIVITY_WINDOW_SECS: u64 = 900;
}

/// HTTP boundary defaults
pub mod http {
    /// Default HTTP port when `HTTP_PORT` is not set
    pub const DEFAULT_HTTP_PORT: u16 = 8000;

    /// Per-request timeout applied by the HTTP layer, in seconds.
    /// LLM round-trips dominate this budget.
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
}

/// LLM defaults
pub mod llm {
    /// Default Gemini model when `WATTSON_LLM_MODEL` is not set
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

    /// Temperature for SQL generation; deterministic output wanted
    pub const SQL_GENERATION_TEMPERATURE: f32 = 0.0;

    /// Maximum number of tool call iterations before forcing a text response
    pub const MAX_TOOL_ITERATIONS: usize = 10;

    /// Outbound HTTP timeout for LLM API calls, in seconds
    pub const API_TIMEOUT_SECS: u64 = 60;
}

/// Database and tenant-isolation constants
pub mod database {
    /// Column every tenant-scoped statement must be filtered on
    pub const TENANT_COLUMN: &str = "house_id";

    /// Maximum connections in the PostgreSQL pool
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
}
