// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Connection state reported by `queryHeadsets`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadsetStatus {
    Discovered,
    Connecting,
    Connected,
    #[serde(other)]
    Unknown,
}

/// A headset as described by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headset {
    pub id: String,
    pub status: HeadsetStatus,
    #[serde(rename = "connectedBy", default)]
    pub connected_by: Option<String>,
}

impl Headset {
    pub fn new(id: impl Into<String>, status: HeadsetStatus) -> Self {
        Self {
            id: id.into(),
            status,
            connected_by: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == HeadsetStatus::Connected
    }
}
