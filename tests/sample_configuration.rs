// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The shipped `cortex_configuration.toml` parses and maps onto the training policy defaults.

use std::path::Path;

use cortex_trainer::agent::training::TrainingPolicy;
use cortex_trainer::config::{load_config, validate_config, ConfigError};

#[test]
fn sample_configuration_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("cortex_configuration.toml");
    let config = load_config(Some(&path), None).expect("sample config parses");
    let policy = TrainingPolicy::default();

    assert_eq!(config.training.max_actions, policy.max_actions);
    assert_eq!(config.training.max_attempts, policy.max_attempts);
    assert_eq!(config.training.stream, policy.stream);
}

#[test]
fn sample_configuration_requires_credentials() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("cortex_configuration.toml");
    let mut config = load_config(Some(&path), None).expect("sample config parses");
    config.application.client_id.clear();

    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::ValidationError(_))
    ));
}
