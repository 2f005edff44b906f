// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `cortex_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub cortex: CortexConfig,
    pub application: ApplicationConfig,
    pub session: SessionConfig,
    pub discovery: DiscoveryConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

/// Cortex service endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CortexConfig {
    /// Websocket URL of the Cortex service (`ws://` or `wss://`)
    pub url: String,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            url: "wss://localhost:6868".to_string(),
        }
    }
}

/// Application credentials issued by the service vendor
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub client_id: String,
    pub client_secret: String,
    /// License key; empty means the user's default license
    pub license: String,
    /// Number of sessions to debit from the license on authorization
    pub debit: u32,
}

/// Session issuance settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Create the session as `active` instead of `open`
    pub activate: bool,
    /// Delay before asking for access again while the user has not approved the application
    pub access_retry_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            activate: false,
            access_retry_interval_ms: 3000,
        }
    }
}

/// Headset discovery settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Delay between two headset queries while none is connected
    pub query_interval_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            query_interval_ms: 1000,
        }
    }
}

/// Training policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Maximum number of actions trained in one run
    pub max_actions: usize,
    /// Maximum attempts per action before it is skipped
    pub max_attempts: u32,
    /// Stream carrying the training lifecycle events
    pub stream: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_actions: 3,
            max_attempts: 3,
            stream: "sys".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    pub level: String,
    /// Console format (`text` or `json`)
    pub format: String,
    /// Base directory for log files (file logging only)
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            log_dir: None,
        }
    }
}
