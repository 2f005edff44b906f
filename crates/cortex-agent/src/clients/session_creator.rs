// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tracing::{debug, info};

use super::{CortexConnection, IssuedSession, SessionIssuance};
use crate::protocol::{CortexReply, CortexRequest, SessionStatus};
use crate::{CortexAgentError, Result};

#[derive(Debug, Clone)]
struct PendingSession {
    headset_id: String,
    license: String,
    token: Option<String>,
}

/// Walks `getUserLogin -> requestAccess -> authorize -> createSession`
#[derive(Debug, Clone)]
pub struct SessionCreator {
    client_id: String,
    client_secret: String,
    debit: u32,
    status: SessionStatus,
    access_retry_interval: Duration,
    pending: Option<PendingSession>,
}

impl SessionCreator {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            debit: 0,
            status: SessionStatus::Open,
            access_retry_interval: Duration::from_secs(3),
            pending: None,
        }
    }

    pub fn with_debit(mut self, debit: u32) -> Self {
        self.debit = debit;
        self
    }

    /// Create `active` sessions instead of `open` ones
    pub fn with_activation(mut self, activate: bool) -> Self {
        self.status = if activate {
            SessionStatus::Active
        } else {
            SessionStatus::Open
        };
        self
    }

    pub fn with_access_retry_interval(mut self, interval: Duration) -> Self {
        self.access_retry_interval = interval;
        self
    }

    fn request_access(&self) -> CortexRequest {
        CortexRequest::RequestAccess {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

impl SessionIssuance for SessionCreator {
    fn create_session(
        &mut self,
        connection: &mut dyn CortexConnection,
        headset_id: &str,
        license: &str,
    ) -> Result<()> {
        info!("[SESSION] Step 1: Checking logged-in user");
        self.pending = Some(PendingSession {
            headset_id: headset_id.to_string(),
            license: license.to_string(),
            token: None,
        });
        connection.send(CortexRequest::GetUserLogin)
    }

    fn on_reply(
        &mut self,
        reply: &CortexReply,
        connection: &mut dyn CortexConnection,
    ) -> Result<Option<IssuedSession>> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };

        match reply {
            CortexReply::UserLogin { usernames } => {
                let Some(user) = usernames.first() else {
                    self.pending = None;
                    return Err(CortexAgentError::NotLoggedIn);
                };
                info!("[SESSION] Step 2: Requesting access for user {}", user);
                connection.send(self.request_access())?;
                Ok(None)
            }
            CortexReply::AccessRequested { granted, message } => {
                if *granted {
                    info!("[SESSION] Step 3: Authorizing");
                    let license = pending.license.clone();
                    connection.send(CortexRequest::Authorize {
                        client_id: self.client_id.clone(),
                        client_secret: self.client_secret.clone(),
                        license,
                        debit: self.debit,
                    })?;
                } else {
                    info!("{}", message);
                    connection.send_after(self.request_access(), self.access_retry_interval)?;
                }
                Ok(None)
            }
            CortexReply::Authorized { token } => {
                info!("[SESSION] Step 4: Creating session on {}", pending.headset_id);
                let request = CortexRequest::CreateSession {
                    token: token.clone(),
                    headset_id: pending.headset_id.clone(),
                    status: self.status,
                };
                if let Some(pending) = self.pending.as_mut() {
                    pending.token = Some(token.clone());
                }
                connection.send(request)?;
                Ok(None)
            }
            CortexReply::SessionCreated { session_id } => {
                let token = pending.token.clone().ok_or_else(|| {
                    CortexAgentError::Other("session created before authorization".to_string())
                })?;
                info!("[SESSION] Session {} created", session_id);
                self.pending = None;
                Ok(Some(IssuedSession {
                    token,
                    session_id: session_id.clone(),
                }))
            }
            other => {
                debug!("[SESSION] Ignoring {:?}", other);
                Ok(None)
            }
        }
    }

    fn clear(&mut self) {
        self.pending = None;
    }
}
