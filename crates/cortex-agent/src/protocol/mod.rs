// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! JSON-RPC vocabulary spoken with the Cortex service.

mod codec;
mod notification;
mod request;

pub use codec::RpcCodec;
pub use notification::{CortexNotification, CortexReply};
pub use request::{CortexRequest, SessionStatus, TrainingStatus};
