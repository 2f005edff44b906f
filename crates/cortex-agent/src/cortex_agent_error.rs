// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the Cortex agent.

/// Result type alias using CortexAgentError
pub type Result<T> = std::result::Result<T, CortexAgentError>;

/// Errors raised by the connection, codec and collaborator helpers
#[derive(Debug, thiserror::Error)]
pub enum CortexAgentError {
    /// Cannot understand what the service sent
    #[error("Unable to decode received data: {0}")]
    UnableToDecodeReceivedData(String),

    /// Failed to hand a frame to the socket
    #[error("Unable to send data: {0}")]
    UnableToSendData(String),

    /// A request was issued before `open()`
    #[error("Connection not opened - call open() first")]
    NotConnected,

    /// Cortex reports no logged-in user
    #[error("No user is logged in to the Cortex service")]
    NotLoggedIn,

    /// A reply referenced a request id that is not outstanding
    #[error("Reply to unknown request id {0}")]
    UnknownRequestId(u64),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/uncategorized error
    #[error("{0}")]
    Other(String),
}
