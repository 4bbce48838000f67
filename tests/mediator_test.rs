// ABOUTME: Integration tests for the query mediator with fake collaborators
// ABOUTME: Asserts the read-only gate, the unconditional tenant rewrite, and outcome normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

use wattson::errors::{AppError, AppResult};
use wattson::mediator::{
    MediationError, QueryExecutor, QueryMediator, QueryOutcome, SqlGenerator,
};

/// Generator returning a fixed statement regardless of the prompt
struct StaticGenerator {
    sql: String,
}

impl StaticGenerator {
    fn new(sql: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { sql: sql.into() })
    }
}

#[async_trait]
impl SqlGenerator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        Ok(self.sql.clone())
    }
}

/// Generator that always fails
struct FailingGenerator;

#[async_trait]
impl SqlGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        Err(AppError::external_service("gemini", "rate limited"))
    }
}

/// Executor recording every statement it receives and returning preset rows
struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    rows: Vec<Map<String, Value>>,
}

impl RecordingExecutor {
    fn new(rows: Vec<Map<String, Value>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            rows,
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(&self, sql: &str) -> AppResult<Vec<Map<String, Value>>> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(sql.to_owned());
        Ok(self.rows.clone())
    }
}

/// Executor that always fails
struct FailingExecutor;

#[async_trait]
impl QueryExecutor for FailingExecutor {
    async fn execute(&self, _sql: &str) -> AppResult<Vec<Map<String, Value>>> {
        Err(AppError::database("relation \"nope\" does not exist"))
    }
}

fn row(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

const SCHEMA: &str = "Table energy_readings: house_id (text), power (double precision)";

#[tokio::test]
async fn test_non_select_statement_is_forbidden_and_never_executed() {
    let executor = RecordingExecutor::new(vec![]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("UPDATE devices SET name='x'"),
        executor.clone(),
    );

    let result = mediator.answer("rename my device", Some("h1"), SCHEMA).await;

    assert!(matches!(result, Err(MediationError::Forbidden { .. })));
    assert!(executor.calls().is_empty(), "executor must never be invoked");
}

#[tokio::test]
async fn test_delete_statement_is_forbidden() {
    let executor = RecordingExecutor::new(vec![]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("DELETE FROM energy_readings"),
        executor.clone(),
    );

    let result = mediator.answer("wipe my data", None, SCHEMA).await;

    assert!(matches!(result, Err(MediationError::Forbidden { .. })));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_code_fences_are_stripped_before_execution() {
    let executor = RecordingExecutor::new(vec![row(&[("power", json!(42.0)), ("device", json!("tv"))])]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("```sql\nSELECT * FROM energy_readings\n```"),
        executor.clone(),
    );

    let result = mediator
        .answer("show readings", None, SCHEMA)
        .await
        .expect("mediation should succeed");

    assert_eq!(result.statement, "SELECT * FROM energy_readings");
    assert!(!result.tenant_enforced);
    assert_eq!(executor.calls(), vec!["SELECT * FROM energy_readings"]);
}

#[tokio::test]
async fn test_tenant_predicate_appended_when_no_clause_exists() {
    let executor = RecordingExecutor::new(vec![row(&[("power", json!(1.0)), ("ts", json!("t"))])]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT * FROM energy_readings"),
        executor.clone(),
    );

    let result = mediator
        .answer("show readings", Some("h7"), SCHEMA)
        .await
        .expect("mediation should succeed");

    assert_eq!(
        result.statement,
        "SELECT * FROM energy_readings WHERE house_id = 'h7'"
    );
    assert!(result.tenant_enforced);
    assert_eq!(
        executor.calls(),
        vec!["SELECT * FROM energy_readings WHERE house_id = 'h7'"]
    );
}

#[tokio::test]
async fn test_tenant_predicate_conjoined_into_existing_clause() {
    let executor = RecordingExecutor::new(vec![row(&[("power", json!(150.0)), ("ts", json!("t"))])]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT * FROM energy_readings WHERE power > 100"),
        executor.clone(),
    );

    let result = mediator
        .answer("show heavy readings", Some("h7"), SCHEMA)
        .await
        .expect("mediation should succeed");

    assert_eq!(
        result.statement,
        "SELECT * FROM energy_readings WHERE house_id = 'h7' AND power > 100"
    );
    assert!(result.tenant_enforced);
}

#[tokio::test]
async fn test_rewrite_happens_even_when_generator_included_a_predicate() {
    // Prompt-injection defense: the generator claiming to have filtered for
    // another tenant must still get the caller's predicate spliced in.
    let executor = RecordingExecutor::new(vec![]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT * FROM energy_readings WHERE house_id = 'h9'"),
        executor.clone(),
    );

    let result = mediator
        .answer("show h9's data", Some("h7"), SCHEMA)
        .await
        .expect("mediation should succeed");

    assert_eq!(
        result.statement,
        "SELECT * FROM energy_readings WHERE house_id = 'h7' AND house_id = 'h9'"
    );
}

#[tokio::test]
async fn test_empty_tenant_is_treated_as_unrestricted() {
    let executor = RecordingExecutor::new(vec![row(&[("n", json!(1)), ("m", json!(2))])]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT * FROM houses"),
        executor.clone(),
    );

    let result = mediator
        .answer("show houses", Some(""), SCHEMA)
        .await
        .expect("mediation should succeed");

    assert_eq!(result.statement, "SELECT * FROM houses");
    assert!(!result.tenant_enforced);
}

#[tokio::test]
async fn test_zero_rows_normalize_to_the_no_data_marker() {
    let executor = RecordingExecutor::new(vec![]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT * FROM energy_readings"),
        executor,
    );

    let result = mediator
        .answer("any readings?", Some("h1"), SCHEMA)
        .await
        .expect("mediation should succeed");

    assert!(result.outcome.is_no_data());
    assert_eq!(result.outcome, QueryOutcome::NoData);
}

#[tokio::test]
async fn test_singleton_scalar_collapses_to_bare_value() {
    let executor = RecordingExecutor::new(vec![row(&[("count", json!(42))])]);
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT count(*) FROM devices"),
        executor,
    );

    let result = mediator
        .answer("how many devices?", Some("h1"), SCHEMA)
        .await
        .expect("mediation should succeed");

    assert_eq!(result.outcome, QueryOutcome::Scalar(json!(42)));
}

#[tokio::test]
async fn test_multi_row_results_stay_a_row_collection() {
    let rows = vec![
        row(&[("device", json!("tv")), ("power", json!(120.0))]),
        row(&[("device", json!("fridge")), ("power", json!(80.0))]),
    ];
    let executor = RecordingExecutor::new(rows.clone());
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT device, power FROM energy_readings"),
        executor,
    );

    let result = mediator
        .answer("per-device power", Some("h1"), SCHEMA)
        .await
        .expect("mediation should succeed");

    assert_eq!(result.outcome, QueryOutcome::Rows(rows));
}

#[tokio::test]
async fn test_generator_failure_is_classified() {
    let executor = RecordingExecutor::new(vec![]);
    let mediator = QueryMediator::new(Arc::new(FailingGenerator), executor.clone());

    let result = mediator.answer("anything", Some("h1"), SCHEMA).await;

    assert!(matches!(
        result,
        Err(MediationError::GenerationFailed { .. })
    ));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_executor_failure_is_classified() {
    let mediator = QueryMediator::new(
        StaticGenerator::new("SELECT * FROM nope"),
        Arc::new(FailingExecutor),
    );

    let result = mediator.answer("query a missing table", Some("h1"), SCHEMA).await;

    assert!(matches!(result, Err(MediationError::ExecutionFailed { .. })));
}
