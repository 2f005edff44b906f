// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # cortex-agent
//!
//! Drives an automated mental-command training run against a Cortex service:
//! connect, find a headset, open a session, subscribe to the system-event
//! stream, then train each action of a detection through start/accept with
//! bounded retries.
//!
//! The decision logic lives in [`training::TrainingStateMachine`], which is
//! pure. [`training::TrainingRunner`] feeds it notifications one at a time and
//! executes its actions against the collaborator traits in [`clients`].

mod common;
mod cortex_agent_error;
pub mod clients;
pub mod protocol;
pub mod training;

pub use common::{Headset, HeadsetStatus};
pub use cortex_agent_error::{CortexAgentError, Result};
