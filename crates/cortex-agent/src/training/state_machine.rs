// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pure training session state machine.
//!
//! Design constraints:
//! - No I/O, no sleeps, no timeouts
//! - At most one outbound action per input, so only one call is ever in flight
//! - Driver-agnostic: the tokio runner and the tests feed the same events
//!
//! Only stream events drive training forward; the acknowledgement of a
//! `training` call is ignored because it is not ordered against the stream.

use tracing::{debug, error, info, warn};

use super::classifier::LifecycleEvent;
use crate::common::Headset;
use crate::protocol::TrainingStatus;

/// Policy bounds and fixed parameters of one run
#[derive(Debug, Clone)]
pub struct TrainingPolicy {
    /// At most this many actions are trained, whatever the detection offers
    pub max_actions: usize,
    /// Attempts per action before it is skipped
    pub max_attempts: u32,
    /// Stream carrying the lifecycle events
    pub stream: String,
    /// License passed to session creation; empty for the default one
    pub license: String,
}

impl Default for TrainingPolicy {
    fn default() -> Self {
        Self {
            max_actions: 3,
            max_attempts: 3,
            stream: "sys".to_string(),
            license: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Completed,
    Disconnected,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingPhase {
    Idle,
    Connecting,
    FetchingInfo,
    DiscoveringDevice,
    CreatingSession,
    Subscribing,
    Training,
    Terminated(Termination),
}

/// Inputs observed by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    Connected,
    ConnectionError(String),
    Disconnected,
    ErrorReceived {
        method: String,
        code: i64,
        message: String,
    },
    DetectionInfo {
        actions: Vec<String>,
        controls: Vec<String>,
        events: Vec<String>,
    },
    HeadsetsFound(Vec<Headset>),
    SessionCreated {
        token: String,
        session_id: String,
    },
    SubscribeOk {
        sid: String,
    },
    TrainingOk(String),
    StreamData {
        session_id: String,
        stream: String,
        time: f64,
        fields: Vec<String>,
    },
    /// Discovery or session issuance gave up
    CollaboratorError(String),
}

/// Calls the driver must perform next
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingAction {
    OpenConnection,
    GetDetectionInfo {
        detection: String,
    },
    FindHeadsets,
    CreateSession {
        headset_id: String,
        license: String,
    },
    Subscribe {
        token: String,
        session_id: String,
        streams: Vec<String>,
    },
    Train {
        token: String,
        session_id: String,
        detection: String,
        action: String,
        status: TrainingStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Accepted,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub name: String,
    pub attempts: u32,
    pub outcome: ActionOutcome,
}

/// What happened to every action attempted so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingReport {
    pub detection: String,
    pub records: Vec<ActionRecord>,
}

impl TrainingReport {
    pub fn accepted(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == ActionOutcome::Accepted)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == ActionOutcome::Skipped)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct TrainingStateMachine {
    policy: TrainingPolicy,
    phase: TrainingPhase,
    detection: String,
    actions: Vec<String>,
    action_index: usize,
    retry_count: u32,
    device_id: Option<String>,
    token: Option<String>,
    session_id: Option<String>,
    report: TrainingReport,
}

impl TrainingStateMachine {
    pub fn new(policy: TrainingPolicy) -> Self {
        Self {
            policy,
            phase: TrainingPhase::Idle,
            detection: String::new(),
            actions: Vec::new(),
            action_index: 0,
            retry_count: 0,
            device_id: None,
            token: None,
            session_id: None,
            report: TrainingReport::default(),
        }
    }

    pub fn policy(&self) -> &TrainingPolicy {
        &self.policy
    }

    pub fn phase(&self) -> &TrainingPhase {
        &self.phase
    }

    pub fn detection(&self) -> &str {
        &self.detection
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn action_index(&self) -> usize {
        self.action_index
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Action being trained, while in the Training phase
    pub fn current_action(&self) -> Option<&str> {
        match self.phase {
            TrainingPhase::Training => self.actions.get(self.action_index).map(String::as_str),
            _ => None,
        }
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    pub fn termination(&self) -> Option<&Termination> {
        match &self.phase {
            TrainingPhase::Terminated(termination) => Some(termination),
            _ => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, TrainingPhase::Terminated(_))
    }

    /// Begin a run for `detection`. Only valid once, from Idle.
    pub fn start(&mut self, detection: &str) -> Option<TrainingAction> {
        if self.phase != TrainingPhase::Idle {
            warn!("[TRAINING] start() ignored in phase {:?}", self.phase);
            return None;
        }
        self.detection = detection.to_string();
        self.report.detection = detection.to_string();
        self.phase = TrainingPhase::Connecting;
        debug!("[TRAINING] Connecting to train '{}'", detection);
        Some(TrainingAction::OpenConnection)
    }

    /// Advance the machine by one observed event.
    pub fn step(&mut self, event: &TrainingEvent) -> Option<TrainingAction> {
        if self.is_terminated() {
            debug!("[TRAINING] Ignoring {:?} after termination", event);
            return None;
        }

        match event {
            TrainingEvent::ErrorReceived {
                method,
                code,
                message,
            } => {
                self.fail(format!("{} failed with code {}: {}", method, code, message));
                None
            }
            TrainingEvent::ConnectionError(reason) => {
                self.fail(format!("connection error: {}", reason));
                None
            }
            TrainingEvent::CollaboratorError(reason) => {
                self.fail(reason.clone());
                None
            }
            TrainingEvent::Disconnected => {
                info!("Disconnected from the service.");
                self.phase = TrainingPhase::Terminated(Termination::Disconnected);
                None
            }
            TrainingEvent::Connected => self.on_connected(),
            TrainingEvent::DetectionInfo { actions, .. } => self.on_detection_info(actions),
            TrainingEvent::HeadsetsFound(headsets) => self.on_headsets_found(headsets),
            TrainingEvent::SessionCreated { token, session_id } => {
                self.on_session_created(token, session_id)
            }
            TrainingEvent::SubscribeOk { sid } => self.on_subscribed(sid),
            TrainingEvent::TrainingOk(message) => {
                debug!("[TRAINING] training acknowledged: {}", message);
                None
            }
            TrainingEvent::StreamData { stream, fields, .. } => self.on_stream_data(stream, fields),
        }
    }

    fn on_connected(&mut self) -> Option<TrainingAction> {
        if self.phase != TrainingPhase::Connecting {
            return self.ignore("Connected");
        }
        self.phase = TrainingPhase::FetchingInfo;
        Some(TrainingAction::GetDetectionInfo {
            detection: self.detection.clone(),
        })
    }

    fn on_detection_info(&mut self, actions: &[String]) -> Option<TrainingAction> {
        if self.phase != TrainingPhase::FetchingInfo {
            return self.ignore("DetectionInfo");
        }
        debug!("[TRAINING] '{}' offers actions {:?}", self.detection, actions);
        self.actions = actions.to_vec();
        self.phase = TrainingPhase::DiscoveringDevice;
        Some(TrainingAction::FindHeadsets)
    }

    fn on_headsets_found(&mut self, headsets: &[Headset]) -> Option<TrainingAction> {
        if self.phase != TrainingPhase::DiscoveringDevice {
            return self.ignore("HeadsetsFound");
        }
        let Some(headset) = headsets.first() else {
            self.fail("no headset found".to_string());
            return None;
        };
        self.device_id = Some(headset.id.clone());
        self.phase = TrainingPhase::CreatingSession;
        Some(TrainingAction::CreateSession {
            headset_id: headset.id.clone(),
            license: self.policy.license.clone(),
        })
    }

    fn on_session_created(&mut self, token: &str, session_id: &str) -> Option<TrainingAction> {
        if self.phase != TrainingPhase::CreatingSession {
            return self.ignore("SessionCreated");
        }
        self.token = Some(token.to_string());
        self.session_id = Some(session_id.to_string());
        self.phase = TrainingPhase::Subscribing;
        Some(TrainingAction::Subscribe {
            token: token.to_string(),
            session_id: session_id.to_string(),
            streams: vec![self.policy.stream.clone()],
        })
    }

    fn on_subscribed(&mut self, sid: &str) -> Option<TrainingAction> {
        if self.phase != TrainingPhase::Subscribing {
            return self.ignore("SubscribeOk");
        }
        debug!("[TRAINING] Subscribed to '{}' for session {}", self.policy.stream, sid);
        self.phase = TrainingPhase::Training;
        self.action_index = 0;
        self.retry_count = 0;
        if self.action_index < self.action_limit() {
            self.train_current(TrainingStatus::Start)
        } else {
            self.complete()
        }
    }

    fn on_stream_data(&mut self, stream: &str, fields: &[String]) -> Option<TrainingAction> {
        if self.phase != TrainingPhase::Training || stream != self.policy.stream {
            return self.ignore("StreamData");
        }
        let action = self.actions.get(self.action_index).cloned().unwrap_or_default();

        let event = LifecycleEvent::classify(fields)?;
        if let Some(line) = event.announcement(&action) {
            info!("{}", line);
        }

        match event {
            LifecycleEvent::Started => None,
            LifecycleEvent::Succeeded => {
                debug!("[TRAINING] '{}' succeeded, accepting", action);
                self.train_current(TrainingStatus::Accept)
            }
            LifecycleEvent::Failed => self.retry(),
            LifecycleEvent::Completed => {
                self.report.records.push(ActionRecord {
                    name: action,
                    attempts: self.retry_count + 1,
                    outcome: ActionOutcome::Accepted,
                });
                self.advance()
            }
        }
    }

    fn retry(&mut self) -> Option<TrainingAction> {
        self.retry_count += 1;
        if self.retry_count < self.policy.max_attempts {
            info!("Sorry, it didn't work. Let's try again.");
            return self.train_current(TrainingStatus::Start);
        }

        info!("It seems you are struggling with this action. Let's try another one.");
        let action = self.actions.get(self.action_index).cloned().unwrap_or_default();
        self.report.records.push(ActionRecord {
            name: action,
            attempts: self.retry_count,
            outcome: ActionOutcome::Skipped,
        });
        self.advance()
    }

    fn advance(&mut self) -> Option<TrainingAction> {
        self.action_index += 1;
        self.retry_count = 0;
        if self.action_index < self.action_limit() {
            self.train_current(TrainingStatus::Start)
        } else {
            self.complete()
        }
    }

    fn complete(&mut self) -> Option<TrainingAction> {
        info!("Done.");
        self.phase = TrainingPhase::Terminated(Termination::Completed);
        None
    }

    fn action_limit(&self) -> usize {
        self.policy.max_actions.min(self.actions.len())
    }

    fn train_current(&self, status: TrainingStatus) -> Option<TrainingAction> {
        let action = self.actions.get(self.action_index)?.clone();
        Some(TrainingAction::Train {
            token: self.token.clone().unwrap_or_default(),
            session_id: self.session_id.clone().unwrap_or_default(),
            detection: self.detection.clone(),
            action,
            status,
        })
    }

    fn ignore(&self, what: &str) -> Option<TrainingAction> {
        debug!("[TRAINING] Ignoring {} in phase {:?}", what, self.phase);
        None
    }

    fn fail(&mut self, reason: String) {
        error!("[TRAINING] {}", reason);
        self.phase = TrainingPhase::Terminated(Termination::Failed(reason));
    }
}
