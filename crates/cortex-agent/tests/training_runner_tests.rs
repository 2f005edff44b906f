// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cortex_agent::clients::{
    CortexConnection, HeadsetDiscovery, HeadsetFinder, IssuedSession, SessionCreator,
    SessionIssuance,
};
use cortex_agent::protocol::{
    CortexNotification, CortexReply, CortexRequest, RpcCodec, TrainingStatus,
};
use cortex_agent::training::{ActionOutcome, Termination, TrainingPolicy, TrainingRunner};
use cortex_agent::{CortexAgentError, Headset, HeadsetStatus, Result};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Open,
    Send(CortexRequest),
    SendAfter(CortexRequest),
    Close,
}

/// Records every call; never talks to a network
#[derive(Clone, Default)]
struct FakeConnection {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeConnection {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn sent_methods(&self) -> Vec<&'static str> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(r) => Some(r.method()),
                _ => None,
            })
            .collect()
    }

    fn trainings(&self) -> Vec<(String, TrainingStatus)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(CortexRequest::Training { action, status, .. }) => Some((action, status)),
                _ => None,
            })
            .collect()
    }
}

impl CortexConnection for FakeConnection {
    fn open(&mut self) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Open);
        Ok(())
    }

    fn send(&mut self, request: CortexRequest) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Send(request));
        Ok(())
    }

    fn send_after(&mut self, request: CortexRequest, _delay: Duration) -> Result<()> {
        self.calls.lock().unwrap().push(Call::SendAfter(request));
        Ok(())
    }

    fn close(&mut self) {
        self.calls.lock().unwrap().push(Call::Close);
    }
}

struct BrokenDiscovery;

impl HeadsetDiscovery for BrokenDiscovery {
    fn find_headsets(&mut self, _connection: &mut dyn CortexConnection) -> Result<()> {
        Err(CortexAgentError::Other("bluetooth adapter missing".to_string()))
    }

    fn on_reply(
        &mut self,
        _reply: &CortexReply,
        _connection: &mut dyn CortexConnection,
    ) -> Result<Option<Vec<Headset>>> {
        Ok(None)
    }

    fn clear(&mut self) {}
}

/// Hands out a session as soon as it is asked for one
struct InstantIssuance {
    requested: Arc<Mutex<Vec<String>>>,
}

impl SessionIssuance for InstantIssuance {
    fn create_session(
        &mut self,
        _connection: &mut dyn CortexConnection,
        headset_id: &str,
        _license: &str,
    ) -> Result<()> {
        self.requested.lock().unwrap().push(headset_id.to_string());
        Ok(())
    }

    fn on_reply(
        &mut self,
        reply: &CortexReply,
        _connection: &mut dyn CortexConnection,
    ) -> Result<Option<IssuedSession>> {
        match reply {
            CortexReply::SessionCreated { session_id } => Ok(Some(IssuedSession {
                token: "instant".to_string(),
                session_id: session_id.clone(),
            })),
            _ => Ok(None),
        }
    }

    fn clear(&mut self) {}
}

fn reply(reply: CortexReply) -> CortexNotification {
    CortexNotification::Reply(reply)
}

fn stream(event: &str) -> CortexNotification {
    CortexNotification::StreamData {
        session_id: "s-1".to_string(),
        stream: "sys".to_string(),
        time: 1.0,
        fields: vec!["mentalCommand".to_string(), format!("MC_{}", event)],
    }
}

/// Notifications a live service would send up to the subscription
fn setup_script(actions: &[&str]) -> Vec<CortexNotification> {
    vec![
        CortexNotification::Connected,
        reply(CortexReply::DetectionInfo {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            controls: vec![],
            events: vec![],
        }),
        reply(CortexReply::HeadsetsQueried(vec![])),
        reply(CortexReply::HeadsetsQueried(vec![Headset::new(
            "INSIGHT-1",
            HeadsetStatus::Discovered,
        )])),
        reply(CortexReply::DeviceControlled {
            command: "connect".to_string(),
            message: "Start connecting".to_string(),
        }),
        reply(CortexReply::HeadsetsQueried(vec![Headset::new(
            "INSIGHT-1",
            HeadsetStatus::Connected,
        )])),
        reply(CortexReply::UserLogin {
            usernames: vec!["alice".to_string()],
        }),
        reply(CortexReply::AccessRequested {
            granted: true,
            message: String::new(),
        }),
        reply(CortexReply::Authorized {
            token: "tok".to_string(),
        }),
        reply(CortexReply::SessionCreated {
            session_id: "s-1".to_string(),
        }),
        reply(CortexReply::Subscribed {
            stream: "sys".to_string(),
            sid: "s-1".to_string(),
        }),
    ]
}

fn queue(script: Vec<CortexNotification>) -> mpsc::UnboundedReceiver<CortexNotification> {
    let (tx, rx) = mpsc::unbounded_channel();
    for notification in script {
        tx.send(notification).unwrap();
    }
    rx
}

fn real_helpers() -> (HeadsetFinder, SessionCreator) {
    (
        HeadsetFinder::new(Duration::from_millis(10)),
        SessionCreator::new("client", "secret"),
    )
}

#[tokio::test]
async fn full_run_trains_and_closes() {
    let mut script = setup_script(&["neutral", "push"]);
    // neutral: one failure, then success
    script.push(stream("Started"));
    script.push(stream("Failed"));
    script.push(stream("Started"));
    script.push(stream("Succeeded"));
    script.push(reply(CortexReply::Trained {
        message: "Accept training successfully".to_string(),
    }));
    script.push(stream("Completed"));
    // push: straight success
    script.push(stream("Started"));
    script.push(stream("Succeeded"));
    script.push(stream("Completed"));

    let connection = FakeConnection::default();
    let (finder, creator) = real_helpers();
    let mut runner = TrainingRunner::new(
        TrainingPolicy::default(),
        connection.clone(),
        finder,
        creator,
        queue(script),
    );

    let summary = runner.run("mentalCommand").await;

    assert_eq!(summary.termination, Termination::Completed);
    assert_eq!(summary.report.accepted(), 2);
    assert_eq!(summary.report.records[0].attempts, 2);
    assert_eq!(
        connection.sent_methods(),
        vec![
            "getDetectionInfo",
            "queryHeadsets",
            "controlDevice",
            "getUserLogin",
            "requestAccess",
            "authorize",
            "createSession",
            "subscribe",
            "training",
            "training",
            "training",
            "training",
            "training",
        ]
    );
    assert_eq!(
        connection.trainings(),
        vec![
            ("neutral".to_string(), TrainingStatus::Start),
            ("neutral".to_string(), TrainingStatus::Start),
            ("neutral".to_string(), TrainingStatus::Accept),
            ("push".to_string(), TrainingStatus::Start),
            ("push".to_string(), TrainingStatus::Accept),
        ]
    );
    let calls = connection.calls();
    assert_eq!(calls.first(), Some(&Call::Open));
    assert_eq!(calls.last(), Some(&Call::Close));
    // Empty list and the post-connect re-query are polled later
    assert_eq!(
        calls
            .iter()
            .filter(|c| matches!(c, Call::SendAfter(CortexRequest::QueryHeadsets)))
            .count(),
        2
    );
}

#[tokio::test]
async fn error_notification_stops_the_run() {
    let mut script = setup_script(&["neutral", "push"]);
    script.push(CortexNotification::ErrorReceived {
        method: "training".to_string(),
        code: -32004,
        message: "Session does not exist".to_string(),
    });
    script.push(stream("Succeeded"));

    let connection = FakeConnection::default();
    let (finder, creator) = real_helpers();
    let mut runner = TrainingRunner::new(
        TrainingPolicy::default(),
        connection.clone(),
        finder,
        creator,
        queue(script),
    );

    let summary = runner.run("mentalCommand").await;

    assert!(summary.is_failure());
    assert_eq!(connection.trainings().len(), 1);
    assert_eq!(connection.calls().last(), Some(&Call::Close));
}

#[tokio::test]
async fn closed_channel_counts_as_disconnect() {
    let connection = FakeConnection::default();
    let (finder, creator) = real_helpers();
    let mut runner = TrainingRunner::new(
        TrainingPolicy::default(),
        connection.clone(),
        finder,
        creator,
        queue(vec![CortexNotification::Connected]),
    );

    let summary = runner.run("mentalCommand").await;

    assert_eq!(summary.termination, Termination::Disconnected);
    assert_eq!(connection.sent_methods(), vec!["getDetectionInfo"]);
}

#[tokio::test]
async fn collaborator_failure_is_fatal() {
    let script = vec![
        CortexNotification::Connected,
        reply(CortexReply::DetectionInfo {
            actions: vec!["neutral".to_string()],
            controls: vec![],
            events: vec![],
        }),
    ];
    let connection = FakeConnection::default();
    let mut runner = TrainingRunner::new(
        TrainingPolicy::default(),
        connection.clone(),
        BrokenDiscovery,
        SessionCreator::new("client", "secret"),
        queue(script),
    );

    let summary = runner.run("mentalCommand").await;

    assert!(matches!(
        &summary.termination,
        Termination::Failed(reason) if reason.contains("bluetooth adapter missing")
    ));
}

#[tokio::test]
async fn missing_user_is_fatal() {
    let mut script = setup_script(&["neutral"]);
    script.truncate(6);
    script.push(reply(CortexReply::UserLogin { usernames: vec![] }));

    let connection = FakeConnection::default();
    let (finder, creator) = real_helpers();
    let mut runner = TrainingRunner::new(
        TrainingPolicy::default(),
        connection.clone(),
        finder,
        creator,
        queue(script),
    );

    let summary = runner.run("mentalCommand").await;

    assert!(summary.is_failure());
    assert!(!connection.sent_methods().contains(&"requestAccess"));
}

#[tokio::test]
async fn exhausted_action_is_reported_as_skipped() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let script = vec![
        CortexNotification::Connected,
        reply(CortexReply::DetectionInfo {
            actions: vec!["neutral".to_string()],
            controls: vec![],
            events: vec![],
        }),
        reply(CortexReply::HeadsetsQueried(vec![Headset::new(
            "EPOC-7",
            HeadsetStatus::Connected,
        )])),
        reply(CortexReply::SessionCreated {
            session_id: "s-1".to_string(),
        }),
        reply(CortexReply::Subscribed {
            stream: "sys".to_string(),
            sid: "s-1".to_string(),
        }),
        stream("Failed"),
        stream("Failed"),
        stream("Failed"),
    ];
    let connection = FakeConnection::default();
    let mut runner = TrainingRunner::new(
        TrainingPolicy::default(),
        connection.clone(),
        HeadsetFinder::default(),
        InstantIssuance {
            requested: Arc::clone(&requested),
        },
        queue(script),
    );

    let summary = runner.run("mentalCommand").await;

    assert_eq!(summary.termination, Termination::Completed);
    assert_eq!(summary.report.records[0].outcome, ActionOutcome::Skipped);
    assert_eq!(summary.report.records[0].attempts, 3);
    assert_eq!(*requested.lock().unwrap(), vec!["EPOC-7".to_string()]);
    assert_eq!(connection.trainings().len(), 3);
}

#[tokio::test]
async fn unreadable_headset_reply_fails_the_run() {
    let mut codec = RpcCodec::new();
    codec.encode(&CortexRequest::QueryHeadsets);
    let unreadable = codec
        .decode(r#"{"id": 1, "jsonrpc": "2.0", "result": [{"id": "INSIGHT-1"}]}"#)
        .unwrap();

    let script = vec![
        CortexNotification::Connected,
        reply(CortexReply::DetectionInfo {
            actions: vec!["neutral".to_string()],
            controls: vec![],
            events: vec![],
        }),
        unreadable,
    ];
    let connection = FakeConnection::default();
    let (finder, creator) = real_helpers();
    let mut runner = TrainingRunner::new(
        TrainingPolicy::default(),
        connection.clone(),
        finder,
        creator,
        queue(script),
    );

    let summary = runner.run("mentalCommand").await;

    assert!(matches!(
        &summary.termination,
        Termination::Failed(reason) if reason.starts_with("queryHeadsets failed")
    ));
    assert!(summary.report.records.is_empty());
    assert_eq!(connection.calls().last(), Some(&Call::Close));
}
