// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Cortex Trainer
//!
//! Umbrella crate for automated mental-command training against an Emotiv
//! Cortex service.
//!
//! - [`agent`]: service client, headset discovery, session issuance and the training state machine
//! - [`config`]: TOML configuration with environment and CLI overrides
//! - [`observability`]: logging initialization and per-crate debug flags

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cortex_agent as agent;
pub use cortex_config as config;
pub use cortex_observability as observability;

pub mod prelude {
    pub use cortex_agent::clients::{CortexClient, HeadsetFinder, SessionCreator};
    pub use cortex_agent::training::{
        Termination, TrainingPolicy, TrainingRunner, TrainingStateMachine, TrainingSummary,
    };
    pub use cortex_config::{load_config, validate_config, TrainerConfig};
}
