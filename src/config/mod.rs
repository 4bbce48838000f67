// ABOUTME: Configuration management for deployment-specific settings
// ABOUTME: Environment-only configuration, no config files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

/// Environment-based configuration management
pub mod environment;

pub use environment::ServerConfig;
