// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde_json::{json, Value};

/// Command sent with a `training` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStatus {
    Start,
    Accept,
}

impl TrainingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStatus::Start => "start",
            TrainingStatus::Accept => "accept",
        }
    }
}

/// Status requested by `createSession`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Active,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Active => "active",
        }
    }
}

/// An outbound call to the service
#[derive(Debug, Clone, PartialEq)]
pub enum CortexRequest {
    GetUserLogin,
    RequestAccess {
        client_id: String,
        client_secret: String,
    },
    Authorize {
        client_id: String,
        client_secret: String,
        license: String,
        debit: u32,
    },
    QueryHeadsets,
    ControlDevice {
        command: String,
        headset_id: String,
    },
    CreateSession {
        token: String,
        headset_id: String,
        status: SessionStatus,
    },
    GetDetectionInfo {
        detection: String,
    },
    Subscribe {
        token: String,
        session_id: String,
        streams: Vec<String>,
    },
    Training {
        token: String,
        session_id: String,
        detection: String,
        action: String,
        status: TrainingStatus,
    },
}

impl CortexRequest {
    /// JSON-RPC method name
    pub fn method(&self) -> &'static str {
        match self {
            CortexRequest::GetUserLogin => "getUserLogin",
            CortexRequest::RequestAccess { .. } => "requestAccess",
            CortexRequest::Authorize { .. } => "authorize",
            CortexRequest::QueryHeadsets => "queryHeadsets",
            CortexRequest::ControlDevice { .. } => "controlDevice",
            CortexRequest::CreateSession { .. } => "createSession",
            CortexRequest::GetDetectionInfo { .. } => "getDetectionInfo",
            CortexRequest::Subscribe { .. } => "subscribe",
            CortexRequest::Training { .. } => "training",
        }
    }

    /// JSON-RPC `params` object
    pub fn params(&self) -> Value {
        match self {
            CortexRequest::GetUserLogin | CortexRequest::QueryHeadsets => json!({}),
            CortexRequest::RequestAccess {
                client_id,
                client_secret,
            } => json!({ "clientId": client_id, "clientSecret": client_secret }),
            CortexRequest::Authorize {
                client_id,
                client_secret,
                license,
                debit,
            } => {
                let mut params = json!({
                    "clientId": client_id,
                    "clientSecret": client_secret,
                    "debit": debit,
                });
                // An empty license selects the user's default one
                if !license.is_empty() {
                    params["license"] = json!(license);
                }
                params
            }
            CortexRequest::ControlDevice {
                command,
                headset_id,
            } => json!({ "command": command, "headset": headset_id }),
            CortexRequest::CreateSession {
                token,
                headset_id,
                status,
            } => json!({
                "cortexToken": token,
                "headset": headset_id,
                "status": status.as_str(),
            }),
            CortexRequest::GetDetectionInfo { detection } => json!({ "detection": detection }),
            CortexRequest::Subscribe {
                token,
                session_id,
                streams,
            } => json!({
                "cortexToken": token,
                "session": session_id,
                "streams": streams,
            }),
            CortexRequest::Training {
                token,
                session_id,
                detection,
                action,
                status,
            } => json!({
                "cortexToken": token,
                "session": session_id,
                "detection": detection,
                "action": action,
                "status": status.as_str(),
            }),
        }
    }
}
