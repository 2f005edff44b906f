// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Mental-command training: stream event classification, the pure training
//! state machine and the tokio runner that drives it.

mod classifier;
mod runner;
mod state_machine;

pub use classifier::{is_event, LifecycleEvent};
pub use runner::{TrainingRunner, TrainingSummary};
pub use state_machine::{
    ActionOutcome, ActionRecord, Termination, TrainingAction, TrainingEvent, TrainingPhase,
    TrainingPolicy, TrainingReport, TrainingStateMachine,
};
