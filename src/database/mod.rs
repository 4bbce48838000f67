// ABOUTME: PostgreSQL query execution and schema-context provision over a sqlx pool
// ABOUTME: Dynamic row-to-JSON conversion for ad-hoc SELECTs issued by the mediator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Database Layer
//!
//! Two collaborators live here: [`PgQueryExecutor`], the execution backend
//! for mediated statements, and [`SchemaCatalog`], which produces the
//! schema-context text injected into generation prompts. Both operate over a
//! shared sqlx PostgreSQL pool.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgColumn, PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::mediator::QueryExecutor;

// ============================================================================
// Query Executor
// ============================================================================

/// Executes mediated SQL statements against PostgreSQL
#[derive(Clone)]
pub struct PgQueryExecutor {
    pool: PgPool,
}

impl PgQueryExecutor {
    /// Create an executor over an existing pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool for the given database URL
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Access the underlying pool (shared with [`SchemaCatalog`])
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Convert one row into a JSON object keyed by column name.
    ///
    /// Column types outside the supported set render as null rather than
    /// failing the whole result.
    fn row_to_json(row: &PgRow) -> Map<String, Value> {
        let mut object = Map::with_capacity(row.columns().len());
        for column in row.columns() {
            object.insert(column.name().to_owned(), Self::decode_column(row, column));
        }
        object
    }

    /// Decode a single column value based on its PostgreSQL type name
    fn decode_column(row: &PgRow, column: &PgColumn) -> Value {
        let idx = column.ordinal();
        match column.type_info().name() {
            "INT2" => row
                .try_get::<Option<i16>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::from),
            "INT4" => row
                .try_get::<Option<i32>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::from),
            "INT8" => row
                .try_get::<Option<i64>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::from),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, |v| Value::from(f64::from(v))),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::from),
            "BOOL" => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::from),
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, |v| Value::from(v.to_rfc3339())),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, |v| Value::from(v.to_string())),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, |v| Value::from(v.to_string())),
            "TIME" => row
                .try_get::<Option<chrono::NaiveTime>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, |v| Value::from(v.to_string())),
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::from),
            other => {
                // Last resort: try a string decode before giving up.
                row.try_get::<Option<String>, _>(idx)
                    .ok()
                    .flatten()
                    .map_or_else(
                        || {
                            warn!(column = column.name(), pg_type = other, "Unsupported column type rendered as null");
                            Value::Null
                        },
                        Value::from,
                    )
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn execute(&self, sql: &str) -> AppResult<Vec<Map<String, Value>>> {
        debug!(sql = %sql, "Executing statement");
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        Ok(rows.iter().map(Self::row_to_json).collect())
    }
}

// ============================================================================
// Schema Catalog
// ============================================================================

/// Fallback schema description used when the live catalog is unreachable
/// and no override is configured
const FALLBACK_SCHEMA: &str = "\
Table energy_readings: house_id (text), device_id (text), power (double precision), recorded_at (timestamptz)
Table devices: device_id (text), house_id (text), name (text), active (boolean)
Table houses: house_id (text), owner (text), tariff (double precision)
Table predictions: house_id (text), predicted_power (double precision), predicted_for (timestamptz)";

/// Schema-context collaborator seam.
///
/// The orchestrator depends on this trait so tests can substitute a fixed
/// document for the live catalog.
#[async_trait]
pub trait SchemaContextProvider: Send + Sync {
    /// Produce the schema-context text injected into generation prompts
    async fn schema_context(&self) -> String;
}

/// Supplies the textual schema description injected into generation prompts.
///
/// The description is fetched live from `information_schema` per request;
/// a configured override document, or the built-in fallback, is used when
/// the live fetch fails. The mediator treats the text as opaque.
pub struct SchemaCatalog {
    pool: PgPool,
    override_document: Option<String>,
}

impl SchemaCatalog {
    /// Create a catalog over a pool with an optional fixed override document
    #[must_use]
    pub const fn new(pool: PgPool, override_document: Option<String>) -> Self {
        Self {
            pool,
            override_document,
        }
    }

    /// List public tables and columns from `information_schema`
    async fn fetch_live_schema(&self) -> AppResult<String> {
        let rows = sqlx::query(
            r"
            SELECT table_name, column_name, data_type
            FROM information_schema.columns
            WHERE table_schema = 'public'
            ORDER BY table_name, ordinal_position
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

        let mut lines: Vec<String> = Vec::new();
        let mut current_table = String::new();

        for row in &rows {
            let table: String = row
                .try_get("table_name")
                .map_err(|e| AppError::database(e.to_string()))?;
            let column: String = row
                .try_get("column_name")
                .map_err(|e| AppError::database(e.to_string()))?;
            let data_type: String = row
                .try_get("data_type")
                .map_err(|e| AppError::database(e.to_string()))?;

            if table != current_table {
                lines.push(format!("Table {table}:"));
                current_table = table;
            }
            lines.push(format!("  {column} ({data_type})"));
        }

        Ok(lines.join("\n"))
    }
}

#[async_trait]
impl SchemaContextProvider for SchemaCatalog {
    /// Produce the schema-context text.
    ///
    /// This operation is total: failures fall back to the override document
    /// or the built-in description rather than surfacing an error into the
    /// conversation path.
    async fn schema_context(&self) -> String {
        if let Some(document) = &self.override_document {
            return document.clone();
        }

        match self.fetch_live_schema().await {
            Ok(schema) if !schema.is_empty() => schema,
            Ok(_) => {
                warn!("information_schema listing came back empty, using fallback description");
                FALLBACK_SCHEMA.to_owned()
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch live schema, using fallback description");
                FALLBACK_SCHEMA.to_owned()
            }
        }
    }
}
