// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, TrainerConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "cortex_configuration.toml";

/// Find the trainer configuration file
///
/// Search order:
/// 1. `CORTEX_CONFIG_PATH` environment variable
/// 2. Current working directory: `./cortex_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("CORTEX_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by CORTEX_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet CORTEX_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for and
///   built-in defaults are used when none exists.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if an explicit config file is missing, or the file contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<TrainerConfig> {
    let mut config = match config_path {
        Some(path) => read_config_file(path)?,
        None => match find_config_file() {
            Ok(path) => read_config_file(&path)?,
            Err(ConfigError::FileNotFound(_)) if env::var("CORTEX_CONFIG_PATH").is_err() => {
                TrainerConfig::default()
            }
            Err(e) => return Err(e),
        },
    };

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> ConfigResult<TrainerConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `CORTEX_URL` -> `cortex.url`
/// - `CORTEX_CLIENT_ID` -> `application.client_id`
/// - `CORTEX_CLIENT_SECRET` -> `application.client_secret`
/// - `CORTEX_LICENSE` -> `application.license`
/// - `CORTEX_DEBIT` -> `application.debit`
/// - `CORTEX_MAX_ACTIONS` -> `training.max_actions`
/// - `CORTEX_MAX_ATTEMPTS` -> `training.max_attempts`
/// - `CORTEX_LOG_LEVEL` -> `logging.level`
/// - `CORTEX_LOG_FORMAT` -> `logging.format`
pub fn apply_environment_overrides(config: &mut TrainerConfig) {
    if let Ok(value) = env::var("CORTEX_URL") {
        config.cortex.url = value;
    }

    if let Ok(value) = env::var("CORTEX_CLIENT_ID") {
        config.application.client_id = value;
    }
    if let Ok(value) = env::var("CORTEX_CLIENT_SECRET") {
        config.application.client_secret = value;
    }
    if let Ok(value) = env::var("CORTEX_LICENSE") {
        config.application.license = value;
    }
    if let Ok(value) = env::var("CORTEX_DEBIT") {
        if let Ok(debit) = value.parse::<u32>() {
            config.application.debit = debit;
        }
    }

    if let Ok(value) = env::var("CORTEX_MAX_ACTIONS") {
        if let Ok(max_actions) = value.parse::<usize>() {
            config.training.max_actions = max_actions;
        }
    }
    if let Ok(value) = env::var("CORTEX_MAX_ATTEMPTS") {
        if let Ok(max_attempts) = value.parse::<u32>() {
            config.training.max_attempts = max_attempts;
        }
    }

    if let Ok(value) = env::var("CORTEX_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("CORTEX_LOG_FORMAT") {
        config.logging.format = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"url": "ws://127.0.0.1:6868", "client_id": "abc"}`)
pub fn apply_cli_overrides(config: &mut TrainerConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("url") {
        config.cortex.url = value.clone();
    }

    if let Some(value) = cli_args.get("client_id") {
        config.application.client_id = value.clone();
    }
    if let Some(value) = cli_args.get("client_secret") {
        config.application.client_secret = value.clone();
    }
    if let Some(value) = cli_args.get("license") {
        config.application.license = value.clone();
    }

    if let Some(value) = cli_args.get("activate") {
        config.session.activate = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}
