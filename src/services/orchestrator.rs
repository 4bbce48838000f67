// ABOUTME: Multi-turn LLM tool-execution loop deciding whether database access is needed
// ABOUTME: Bridges model function calls to the query mediator, schema catalog, and cost helper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Agent Orchestrator
//!
//! Runs the bounded function-calling loop for one conversation turn. The
//! model decides per iteration whether to inspect the schema, query the
//! database (through the mediator, never around it), convert energy into
//! cost, or answer directly without touching any tool.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::constants::llm::MAX_TOOL_ITERATIONS;
use crate::database::SchemaContextProvider;
use crate::errors::{AppError, AppResult};
use crate::llm::{
    add_function_responses_to_messages, get_wattson_system_prompt, prompts, ChatMessage,
    ChatRequest, FunctionCall, FunctionDeclaration, FunctionResponse, LlmProvider, Tool,
};
use crate::mediator::{MediatedResult, QueryMediator, QueryOutcome};
use crate::tools::calculate_electricity_cost;

/// The agent-orchestration collaborator seam.
///
/// [`ConversationService`](super::ConversationService) depends on this trait
/// rather than the concrete loop so its composition and recording behavior
/// can be tested with a deterministic fake.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Produce an answer for a composed conversation input
    async fn respond(&self, composed_input: &str, tenant: Option<&str>) -> AppResult<String>;
}

/// Orchestrates one conversation turn through the LLM tool loop
pub struct AgentOrchestrator {
    provider: Arc<dyn LlmProvider>,
    mediator: Arc<QueryMediator>,
    schema: Arc<dyn SchemaContextProvider>,
}

impl AgentOrchestrator {
    /// Create an orchestrator over its collaborators
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        mediator: Arc<QueryMediator>,
        schema: Arc<dyn SchemaContextProvider>,
    ) -> Self {
        Self {
            provider,
            mediator,
            schema,
        }
    }

    /// Build the tool declarations offered to the model
    fn build_tools() -> Vec<Tool> {
        vec![Tool {
            function_declarations: vec![
                FunctionDeclaration {
                    name: "check_database_schema".to_owned(),
                    description:
                        "Get the database structure: available tables, columns, and data types. \
                         Use only when a data query is needed."
                            .to_owned(),
                    parameters: Some(json!({"type": "object", "properties": {}})),
                },
                FunctionDeclaration {
                    name: "query_database".to_owned(),
                    description:
                        "Generate and execute a SQL query for a natural-language question. \
                         Use only when actual data from the database is needed."
                            .to_owned(),
                    parameters: Some(json!({
                        "type": "object",
                        "properties": {"question": {"type": "string"}},
                        "required": ["question"]
                    })),
                },
                FunctionDeclaration {
                    name: "calculate_electricity_cost".to_owned(),
                    description:
                        "Calculate electricity cost from energy consumption in kWh and an \
                         optional tariff in INR per kWh."
                            .to_owned(),
                    parameters: Some(json!({
                        "type": "object",
                        "properties": {
                            "energy_kwh": {"type": "number"},
                            "tariff_inr": {"type": "number"}
                        },
                        "required": ["energy_kwh"]
                    })),
                },
            ],
        }]
    }

    /// Build the system prompt, extending it with the tenant security
    /// directives when a tenant is present
    fn build_system_prompt(tenant: Option<&str>) -> String {
        match tenant {
            Some(tenant) => format!(
                "{}\n\n{}",
                get_wattson_system_prompt(),
                prompts::tenant_security_instructions(tenant)
            ),
            None => get_wattson_system_prompt().to_owned(),
        }
    }

    /// Execute a single tool call and render its result for the model
    async fn execute_tool(&self, call: &FunctionCall, tenant: Option<&str>) -> Value {
        debug!(tool = %call.name, "Executing tool call");
        match call.name.as_str() {
            "check_database_schema" => {
                let schema = self.schema.schema_context().await;
                json!({"schema": prompts::schema_overview(&schema)})
            }
            "query_database" => {
                let question = call
                    .args
                    .get("question")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                self.run_mediated_query(question, tenant).await
            }
            "calculate_electricity_cost" => {
                let energy_kwh = call
                    .args
                    .get("energy_kwh")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                let tariff = call.args.get("tariff_inr").and_then(Value::as_f64);
                calculate_electricity_cost(energy_kwh, tariff)
            }
            other => {
                warn!(tool = %other, "Model requested unknown tool");
                json!({"error": format!("Unknown tool: {other}")})
            }
        }
    }

    /// Run a question through the mediator and render the outcome as a tool
    /// result. Mediation failures become structured error payloads; raw
    /// collaborator detail stays in the logs.
    async fn run_mediated_query(&self, question: &str, tenant: Option<&str>) -> Value {
        let schema_context = self.schema.schema_context().await;
        match self.mediator.answer(question, tenant, &schema_context).await {
            Ok(result) => Self::render_mediated_result(&result),
            Err(e) => {
                warn!(error = %e, "Mediated query failed");
                json!({"status": "error", "message": e.to_string()})
            }
        }
    }

    /// Render a mediated result for the model.
    ///
    /// The no-data case is an explicit marker so the model can tell the user
    /// "nothing found" instead of hallucinating from an empty payload.
    fn render_mediated_result(result: &MediatedResult) -> Value {
        match &result.outcome {
            QueryOutcome::NoData => json!({
                "status": "no_data",
                "message": "The query ran successfully but returned no data."
            }),
            QueryOutcome::Scalar(value) => json!({"status": "ok", "value": value}),
            QueryOutcome::Rows(rows) => json!({"status": "ok", "rows": rows}),
        }
    }
}

#[async_trait]
impl QuestionAnswerer for AgentOrchestrator {
    async fn respond(&self, composed_input: &str, tenant: Option<&str>) -> AppResult<String> {
        let mut messages = vec![
            ChatMessage::system(Self::build_system_prompt(tenant)),
            ChatMessage::user(composed_input),
        ];
        let tools = Self::build_tools();

        for iteration in 0..MAX_TOOL_ITERATIONS {
            let request = ChatRequest::new(messages.clone());
            let response = self
                .provider
                .complete_with_tools(&request, Some(tools.clone()))
                .await?;

            if response.has_function_calls() {
                let calls = response.function_calls.unwrap_or_default();
                debug!(iteration, count = calls.len(), "Model requested tool calls");

                let mut responses = Vec::with_capacity(calls.len());
                for call in &calls {
                    let result = self.execute_tool(call, tenant).await;
                    responses.push(FunctionResponse {
                        name: call.name.clone(),
                        response: result,
                    });
                }
                add_function_responses_to_messages(&mut messages, &responses);
                continue;
            }

            if let Some(text) = response.content {
                return Ok(text);
            }

            return Err(AppError::internal(
                "Model returned neither content nor function calls",
            ));
        }

        // Tool budget exhausted: force a plain text answer.
        warn!("Tool iteration limit reached, forcing text response");
        let response = self.provider.complete(&ChatRequest::new(messages)).await?;
        Ok(response.content)
    }
}
