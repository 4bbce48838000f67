// ABOUTME: Tool implementations exposed to the LLM function-calling loop
// ABOUTME: Each tool renders its result as a JSON value fed back into the conversation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

//! # Tools
//!
//! Function-calling tools available to the conversation loop. The database
//! tools are wired by the orchestrator (they need the mediator and schema
//! catalog); the pure helpers live here.

pub mod electricity_cost;

pub use electricity_cost::calculate_electricity_cost;
