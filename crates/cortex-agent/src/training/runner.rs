// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Single-actor driver for [`TrainingStateMachine`].
//!
//! Notifications are read one at a time from a tokio channel, translated into
//! [`TrainingEvent`]s and stepped through the machine; the action it returns is
//! executed against the collaborators before the next notification is read.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::state_machine::{
    Termination, TrainingAction, TrainingEvent, TrainingPolicy, TrainingReport, TrainingStateMachine,
};
use crate::clients::{CortexConnection, HeadsetDiscovery, SessionIssuance};
use crate::protocol::{CortexNotification, CortexReply, CortexRequest};
use crate::Result;

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSummary {
    pub termination: Termination,
    pub report: TrainingReport,
}

impl TrainingSummary {
    pub fn is_failure(&self) -> bool {
        matches!(self.termination, Termination::Failed(_))
    }
}

pub struct TrainingRunner<C, D, S> {
    machine: TrainingStateMachine,
    connection: C,
    discovery: D,
    issuance: S,
    notifications: mpsc::UnboundedReceiver<CortexNotification>,
}

impl<C, D, S> TrainingRunner<C, D, S>
where
    C: CortexConnection,
    D: HeadsetDiscovery,
    S: SessionIssuance,
{
    pub fn new(
        policy: TrainingPolicy,
        connection: C,
        discovery: D,
        issuance: S,
        notifications: mpsc::UnboundedReceiver<CortexNotification>,
    ) -> Self {
        Self {
            machine: TrainingStateMachine::new(policy),
            connection,
            discovery,
            issuance,
            notifications,
        }
    }

    pub fn machine(&self) -> &TrainingStateMachine {
        &self.machine
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Train `detection` until the machine terminates
    pub async fn run(&mut self, detection: &str) -> TrainingSummary {
        let first = self.machine.start(detection);
        self.execute(first);

        while !self.machine.is_terminated() {
            let Some(notification) = self.notifications.recv().await else {
                debug!("[RUNNER] Notification channel closed");
                self.step(TrainingEvent::Disconnected);
                break;
            };
            if let Some(event) = self.translate(notification) {
                self.step(event);
            }
        }

        self.shutdown();
        self.summary()
    }

    /// Stop the helpers and close the connection
    pub fn shutdown(&mut self) {
        self.discovery.clear();
        self.issuance.clear();
        self.connection.close();
    }

    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            termination: self
                .machine
                .termination()
                .cloned()
                .unwrap_or(Termination::Disconnected),
            report: self.machine.report().clone(),
        }
    }

    fn step(&mut self, event: TrainingEvent) {
        let action = self.machine.step(&event);
        self.execute(action);
    }

    fn execute(&mut self, mut action: Option<TrainingAction>) {
        while let Some(next) = action.take() {
            if let Err(e) = self.perform(next) {
                action = self
                    .machine
                    .step(&TrainingEvent::CollaboratorError(e.to_string()));
            }
        }
    }

    fn perform(&mut self, action: TrainingAction) -> Result<()> {
        debug!("[RUNNER] {:?}", action);
        match action {
            TrainingAction::OpenConnection => self.connection.open(),
            TrainingAction::GetDetectionInfo { detection } => self
                .connection
                .send(CortexRequest::GetDetectionInfo { detection }),
            TrainingAction::FindHeadsets => self.discovery.find_headsets(&mut self.connection),
            TrainingAction::CreateSession {
                headset_id,
                license,
            } => self
                .issuance
                .create_session(&mut self.connection, &headset_id, &license),
            TrainingAction::Subscribe {
                token,
                session_id,
                streams,
            } => self.connection.send(CortexRequest::Subscribe {
                token,
                session_id,
                streams,
            }),
            TrainingAction::Train {
                token,
                session_id,
                detection,
                action,
                status,
            } => self.connection.send(CortexRequest::Training {
                token,
                session_id,
                detection,
                action,
                status,
            }),
        }
    }

    fn translate(&mut self, notification: CortexNotification) -> Option<TrainingEvent> {
        match notification {
            CortexNotification::Connected => Some(TrainingEvent::Connected),
            CortexNotification::Disconnected => Some(TrainingEvent::Disconnected),
            CortexNotification::ConnectionError(reason) => {
                Some(TrainingEvent::ConnectionError(reason))
            }
            CortexNotification::ErrorReceived {
                method,
                code,
                message,
            } => Some(TrainingEvent::ErrorReceived {
                method,
                code,
                message,
            }),
            CortexNotification::Warning { code, message } => {
                warn!("[RUNNER] Cortex warning {}: {}", code, message);
                None
            }
            CortexNotification::StreamData {
                session_id,
                stream,
                time,
                fields,
            } => Some(TrainingEvent::StreamData {
                session_id,
                stream,
                time,
                fields,
            }),
            CortexNotification::Reply(reply) => self.translate_reply(reply),
        }
    }

    fn translate_reply(&mut self, reply: CortexReply) -> Option<TrainingEvent> {
        match reply {
            CortexReply::DetectionInfo {
                actions,
                controls,
                events,
            } => Some(TrainingEvent::DetectionInfo {
                actions,
                controls,
                events,
            }),
            CortexReply::Subscribed { stream, sid } => {
                info!("[RUNNER] Subscribed to {}", stream);
                Some(TrainingEvent::SubscribeOk { sid })
            }
            CortexReply::Trained { message } => Some(TrainingEvent::TrainingOk(message)),
            CortexReply::HeadsetsQueried(_) | CortexReply::DeviceControlled { .. } => {
                match self.discovery.on_reply(&reply, &mut self.connection) {
                    Ok(Some(headsets)) => Some(TrainingEvent::HeadsetsFound(headsets)),
                    Ok(None) => None,
                    Err(e) => Some(TrainingEvent::CollaboratorError(e.to_string())),
                }
            }
            CortexReply::UserLogin { .. }
            | CortexReply::AccessRequested { .. }
            | CortexReply::Authorized { .. }
            | CortexReply::SessionCreated { .. } => {
                match self.issuance.on_reply(&reply, &mut self.connection) {
                    Ok(Some(session)) => Some(TrainingEvent::SessionCreated {
                        token: session.token,
                        session_id: session.session_id,
                    }),
                    Ok(None) => None,
                    Err(e) => Some(TrainingEvent::CollaboratorError(e.to_string())),
                }
            }
        }
    }
}
