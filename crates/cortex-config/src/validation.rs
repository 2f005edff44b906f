// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures the loaded configuration can actually drive a training run before
//! any connection is attempted.

use crate::{ConfigError, ConfigResult, TrainerConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    InvalidUrl { url: String },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl { url } => {
                write!(f, "cortex.url = {} must start with ws:// or wss://", url)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - A websocket endpoint URL
/// - Application credentials
/// - Non-zero training bounds and polling intervals
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &TrainerConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_endpoint(config, &mut errors);
    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_endpoint(config: &TrainerConfig, errors: &mut Vec<ConfigValidationError>) {
    let url = config.cortex.url.trim();
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        errors.push(ConfigValidationError::InvalidUrl {
            url: config.cortex.url.clone(),
        });
    }
}

fn validate_required_fields(config: &TrainerConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.application.client_id.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "application.client_id".to_string(),
        });
    }
    if config.application.client_secret.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "application.client_secret".to_string(),
        });
    }
    if config.training.stream.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "training.stream".to_string(),
        });
    }
}

fn validate_value_ranges(config: &TrainerConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.training.max_actions == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "training.max_actions".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.training.max_attempts == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "training.max_attempts".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.discovery.query_interval_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "discovery.query_interval_ms".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.session.access_retry_interval_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "session.access_retry_interval_ms".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let valid_formats = ["text", "json"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!("must be one of: {}", valid_formats.join(", ")),
        });
    }
}
