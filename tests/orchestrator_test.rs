// ABOUTME: Tests for the LLM tool-execution loop with a scripted provider
// ABOUTME: Covers direct answers, schema/query/cost tool dispatch, and tenant directives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use wattson::database::SchemaContextProvider;
use wattson::errors::{AppError, AppResult};
use wattson::llm::{
    ChatRequest, ChatResponse, ChatResponseWithTools, FunctionCall, LlmProvider, MessageRole, Tool,
};
use wattson::mediator::{QueryExecutor, QueryMediator, SqlGenerator};
use wattson::services::{AgentOrchestrator, QuestionAnswerer};

// ============================================================================
// Scripted Collaborators
// ============================================================================

/// Provider replaying a fixed sequence of tool-loop responses
struct ScriptedProvider {
    responses: Mutex<VecDeque<ChatResponseWithTools>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ChatResponseWithTools>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Ok(ChatResponse {
            content: "forced text response".to_owned(),
            model: "test-model".to_owned(),
            usage: None,
            finish_reason: None,
        })
    }

    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        _tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponseWithTools, AppError> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request.clone());
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .pop_front()
            .ok_or_else(|| AppError::internal("script exhausted"))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

fn text_response(text: &str) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: Some(text.to_owned()),
        function_calls: None,
        model: "test-model".to_owned(),
        usage: None,
        finish_reason: Some("stop".to_owned()),
    }
}

fn call_response(name: &str, args: Value) -> ChatResponseWithTools {
    ChatResponseWithTools {
        content: None,
        function_calls: Some(vec![FunctionCall {
            name: name.to_owned(),
            args,
        }]),
        model: "test-model".to_owned(),
        usage: None,
        finish_reason: None,
    }
}

/// Generator returning a fixed statement
struct StaticGenerator {
    sql: String,
}

#[async_trait]
impl SqlGenerator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        Ok(self.sql.clone())
    }
}

/// Executor recording statements and returning preset rows
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

/// Fixed schema document
struct StaticSchema;

#[async_trait]
impl SchemaContextProvider for StaticSchema {
    async fn schema_context(&self) -> String {
        "Table energy_readings: house_id (text), power (double precision)".to_owned()
    }
}

fn orchestrator_with(
    provider: Arc<ScriptedProvider>,
    sql: &str,
    rows: Vec<Map<String, Value>>,
) -> (AgentOrchestrator, Arc<RecordingExecutor>) {
    let executor = RecordingExecutor::new(rows);
    let mediator = Arc::new(QueryMediator::new(
        Arc::new(StaticGenerator {
            sql: sql.to_owned(),
        }),
        executor.clone(),
    ));
    let orchestrator = AgentOrchestrator::new(provider, mediator, Arc::new(StaticSchema));
    (orchestrator, executor)
}

fn scalar_row(key: &str, value: Value) -> Vec<Map<String, Value>> {
    let mut row = Map::new();
    row.insert(key.to_owned(), value);
    vec![row]
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_direct_answer_never_touches_the_database() {
    let provider = ScriptedProvider::new(vec![text_response("Watts measure power.")]);
    let (orchestrator, executor) =
        orchestrator_with(provider.clone(), "SELECT 1", vec![]);

    let answer = orchestrator
        .respond("what is a watt?", Some("h1"))
        .await
        .expect("respond should succeed");

    assert_eq!(answer, "Watts measure power.");
    assert!(executor.calls().is_empty());
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn test_query_database_call_runs_through_the_mediator() {
    let provider = ScriptedProvider::new(vec![
        call_response("query_database", json!({"question": "total power today"})),
        text_response("Your total power today is 42W."),
    ]);
    let (orchestrator, executor) = orchestrator_with(
        provider.clone(),
        "SELECT sum(power) FROM energy_readings",
        scalar_row("sum", json!(42.0)),
    );

    let answer = orchestrator
        .respond("total power today?", Some("h7"))
        .await
        .expect("respond should succeed");

    assert_eq!(answer, "Your total power today is 42W.");
    // The executed statement carries the tenant predicate - the orchestrator
    // cannot reach the executor around the mediator.
    assert_eq!(
        executor.calls(),
        vec!["SELECT sum(power) FROM energy_readings WHERE house_id = 'h7'"]
    );

    // The tool result was fed back into the second model request.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let fed_back = &requests[1].messages.last().expect("tool result message").content;
    assert!(fed_back.contains("[Tool Result for query_database]"));
    assert!(fed_back.contains("42"));
}

#[tokio::test]
async fn test_schema_tool_returns_the_overview_document() {
    let provider = ScriptedProvider::new(vec![
        call_response("check_database_schema", json!({})),
        text_response("done"),
    ]);
    let (orchestrator, _executor) = orchestrator_with(provider.clone(), "SELECT 1", vec![]);

    orchestrator
        .respond("what tables exist?", None)
        .await
        .expect("respond should succeed");

    let requests = provider.requests();
    let fed_back = &requests[1].messages.last().expect("tool result message").content;
    assert!(fed_back.contains("Database Schema Overview"));
    assert!(fed_back.contains("Table energy_readings"));
}

#[tokio::test]
async fn test_cost_tool_is_computed_locally() {
    let provider = ScriptedProvider::new(vec![
        call_response("calculate_electricity_cost", json!({"energy_kwh": 10.0})),
        text_response("That costs 80 INR."),
    ]);
    let (orchestrator, executor) = orchestrator_with(provider.clone(), "SELECT 1", vec![]);

    let answer = orchestrator
        .respond("cost of 10 kWh?", Some("h1"))
        .await
        .expect("respond should succeed");

    assert_eq!(answer, "That costs 80 INR.");
    assert!(executor.calls().is_empty());

    let requests = provider.requests();
    let fed_back = &requests[1].messages.last().expect("tool result message").content;
    assert!(fed_back.contains("80"));
}

#[tokio::test]
async fn test_forbidden_statement_surfaces_as_tool_error_not_execution() {
    let provider = ScriptedProvider::new(vec![
        call_response("query_database", json!({"question": "rename my device"})),
        text_response("I can only read data, not change it."),
    ]);
    let (orchestrator, executor) =
        orchestrator_with(provider.clone(), "UPDATE devices SET name='x'", vec![]);

    let answer = orchestrator
        .respond("rename my device", Some("h1"))
        .await
        .expect("respond should succeed");

    assert_eq!(answer, "I can only read data, not change it.");
    assert!(executor.calls().is_empty());

    let requests = provider.requests();
    let fed_back = &requests[1].messages.last().expect("tool result message").content;
    assert!(fed_back.contains("error"));
}

#[tokio::test]
async fn test_tenant_directives_are_appended_to_the_system_prompt() {
    let provider = ScriptedProvider::new(vec![text_response("hi")]);
    let (orchestrator, _executor) = orchestrator_with(provider.clone(), "SELECT 1", vec![]);

    orchestrator
        .respond("hello", Some("h7"))
        .await
        .expect("respond should succeed");

    let requests = provider.requests();
    let system = &requests[0].messages[0];
    assert_eq!(system.role, MessageRole::System);
    assert!(system.content.contains("CRITICAL SECURITY"));
    assert!(system.content.contains("house_id='h7'"));
}

#[tokio::test]
async fn test_unrestricted_caller_gets_no_tenant_directives() {
    let provider = ScriptedProvider::new(vec![text_response("hi")]);
    let (orchestrator, _executor) = orchestrator_with(provider.clone(), "SELECT 1", vec![]);

    orchestrator
        .respond("hello", None)
        .await
        .expect("respond should succeed");

    let requests = provider.requests();
    assert!(!requests[0].messages[0].content.contains("CRITICAL SECURITY"));
}
