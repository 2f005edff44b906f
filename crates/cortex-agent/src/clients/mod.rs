// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collaborators the training runner drives.
//!
//! Each is a narrow trait so the runner can be exercised with scripted fakes;
//! the concrete implementations talk to a live service.

mod cortex_client;
mod headset_finder;
mod session_creator;

use std::time::Duration;

use crate::common::Headset;
use crate::protocol::{CortexReply, CortexRequest};
use crate::Result;

pub use cortex_client::CortexClient;
pub use headset_finder::HeadsetFinder;
pub use session_creator::SessionCreator;

/// Outbound side of the service connection
///
/// Calls never block; replies come back later as notifications.
pub trait CortexConnection {
    /// Start connecting. Requests sent before the handshake completes are queued.
    fn open(&mut self) -> Result<()>;

    fn send(&mut self, request: CortexRequest) -> Result<()>;

    /// Send `request` once `delay` has elapsed
    fn send_after(&mut self, request: CortexRequest, delay: Duration) -> Result<()>;

    fn close(&mut self);
}

/// Finds a connected headset
pub trait HeadsetDiscovery {
    fn find_headsets(&mut self, connection: &mut dyn CortexConnection) -> Result<()>;

    /// Feed a reply; returns the headset list once one is connected
    fn on_reply(
        &mut self,
        reply: &CortexReply,
        connection: &mut dyn CortexConnection,
    ) -> Result<Option<Vec<Headset>>>;

    /// Stop reacting to replies
    fn clear(&mut self);
}

/// Token and session handed out by [`SessionIssuance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub session_id: String,
}

/// Obtains an authorization token and a session for a headset
pub trait SessionIssuance {
    fn create_session(
        &mut self,
        connection: &mut dyn CortexConnection,
        headset_id: &str,
        license: &str,
    ) -> Result<()>;

    /// Feed a reply; returns the session once it exists
    fn on_reply(
        &mut self,
        reply: &CortexReply,
        connection: &mut dyn CortexConnection,
    ) -> Result<Option<IssuedSession>>;

    /// Stop reacting to replies
    fn clear(&mut self);
}
