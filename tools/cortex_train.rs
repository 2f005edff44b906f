// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! `cortex-train`: train every action of a detection on the first connected headset.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use tokio::sync::mpsc;
use tracing::{error, info};

use cortex_agent::clients::{CortexClient, HeadsetFinder, SessionCreator};
use cortex_agent::training::{
    ActionOutcome, Termination, TrainingPolicy, TrainingRunner, TrainingSummary,
};
use cortex_config::{load_config, validate_config, TrainerConfig};
use cortex_observability::{
    apply_env_debug_flags, debug_flags_help, init_logging, CrateDebugFlags, LogFormat, LoggingConfig,
    LoggingGuard,
};

const EXIT_FAILED: u8 = 1;
const EXIT_STARTUP: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

/// Cortex Trainer - automated mental-command training
#[derive(Parser, Debug)]
#[command(name = "cortex-train", version, author, long_about = None)]
struct Args {
    /// Detection to train (e.g. "mentalCommand")
    detection: String,

    /// Path to cortex_configuration.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cortex websocket URL (e.g. "wss://localhost:6868")
    #[arg(long)]
    url: Option<String>,

    /// Application client id
    #[arg(long)]
    client_id: Option<String>,

    /// Application client secret
    #[arg(long)]
    client_secret: Option<String>,

    /// License key (the user's default license when omitted)
    #[arg(long)]
    license: Option<String>,

    /// Enable debug logging for a crate; repeatable, `all` for every crate
    #[arg(long = "debug", value_name = "CRATE")]
    debug: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let pairs = [
            ("url", &self.url),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("license", &self.license),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value.clone());
            }
        }
        if self.verbose {
            overrides.insert("log_level".to_string(), "debug".to_string());
        }
        overrides
    }
}

fn load(args: &Args) -> Result<TrainerConfig> {
    let config = load_config(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load configuration")?;
    validate_config(&config)?;
    Ok(config)
}

fn start_logging(args: &Args, config: &TrainerConfig) -> Result<LoggingGuard> {
    let mut debug_flags = CrateDebugFlags::from_crate_names(&args.debug);
    apply_env_debug_flags(&mut debug_flags);

    let logging = LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.parse::<LogFormat>()?,
        log_dir: config.logging.log_dir.clone(),
        ..LoggingConfig::default()
    };
    init_logging(&logging, &debug_flags)
}

fn policy(config: &TrainerConfig) -> TrainingPolicy {
    TrainingPolicy {
        max_actions: config.training.max_actions,
        max_attempts: config.training.max_attempts,
        stream: config.training.stream.clone(),
        license: config.application.license.clone(),
    }
}

fn report(summary: &TrainingSummary) {
    for record in &summary.report.records {
        let outcome = match record.outcome {
            ActionOutcome::Accepted => "accepted",
            ActionOutcome::Skipped => "skipped",
        };
        info!("  {} - {} after {} attempt(s)", record.name, outcome, record.attempts);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = Args::command().after_help(debug_flags_help()).get_matches();
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    let _logging_guard = match start_logging(&args, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    info!(
        "cortex-train {} - training '{}' via {}",
        env!("CARGO_PKG_VERSION"),
        args.detection,
        config.cortex.url
    );

    let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
    let client = CortexClient::new(config.cortex.url.clone(), notifications_tx);
    let finder = HeadsetFinder::new(Duration::from_millis(config.discovery.query_interval_ms));
    let creator = SessionCreator::new(
        config.application.client_id.clone(),
        config.application.client_secret.clone(),
    )
    .with_debit(config.application.debit)
    .with_activation(config.session.activate)
    .with_access_retry_interval(Duration::from_millis(config.session.access_retry_interval_ms));

    let mut runner = TrainingRunner::new(policy(&config), client, finder, creator, notifications_rx);

    let outcome = tokio::select! {
        summary = runner.run(&args.detection) => Some(summary),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(summary) = outcome else {
        info!("Interrupted, closing the connection");
        runner.shutdown();
        return ExitCode::from(EXIT_INTERRUPTED);
    };

    report(&summary);
    match summary.termination {
        Termination::Completed | Termination::Disconnected => ExitCode::SUCCESS,
        Termination::Failed(reason) => {
            error!("Training failed: {}", reason);
            ExitCode::from(EXIT_FAILED)
        }
    }
}
