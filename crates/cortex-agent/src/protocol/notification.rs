// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::common::Headset;

/// Typed result of a successful call, matched to its request by id
#[derive(Debug, Clone, PartialEq)]
pub enum CortexReply {
    UserLogin {
        usernames: Vec<String>,
    },
    AccessRequested {
        granted: bool,
        message: String,
    },
    Authorized {
        token: String,
    },
    HeadsetsQueried(Vec<Headset>),
    DeviceControlled {
        command: String,
        message: String,
    },
    SessionCreated {
        session_id: String,
    },
    DetectionInfo {
        actions: Vec<String>,
        controls: Vec<String>,
        events: Vec<String>,
    },
    Subscribed {
        stream: String,
        sid: String,
    },
    Trained {
        message: String,
    },
}

/// Everything the connection reports, delivered one at a time
#[derive(Debug, Clone, PartialEq)]
pub enum CortexNotification {
    Connected,
    Disconnected,
    ConnectionError(String),
    Reply(CortexReply),
    ErrorReceived {
        method: String,
        code: i64,
        message: String,
    },
    Warning {
        code: i64,
        message: String,
    },
    StreamData {
        session_id: String,
        stream: String,
        time: f64,
        fields: Vec<String>,
    },
}
