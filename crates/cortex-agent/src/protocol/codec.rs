// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Request encoding and reply correlation.
//!
//! Every encoded request gets the next id; the id is remembered with its
//! method until the matching reply or error arrives, so a reply can be typed
//! without the service echoing the method back.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use super::{CortexNotification, CortexReply, CortexRequest};
use crate::common::Headset;
use crate::{CortexAgentError, Result};

#[derive(Debug, Default)]
pub struct RpcCodec {
    next_id: u64,
    pending: HashMap<u64, &'static str>,
}

impl RpcCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls still waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Serialize a request as a JSON-RPC 2.0 text frame
    pub fn encode(&mut self, request: &CortexRequest) -> String {
        self.next_id += 1;
        let id = self.next_id;
        self.pending.insert(id, request.method());

        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": request.method(),
            "params": request.params(),
        })
        .to_string()
    }

    /// Turn one inbound text frame into exactly one notification
    pub fn decode(&mut self, text: &str) -> Result<CortexNotification> {
        let value: Value = serde_json::from_str(text)?;
        let object = value.as_object().ok_or_else(|| {
            CortexAgentError::UnableToDecodeReceivedData(format!("not a JSON object: {}", text))
        })?;

        if let Some(id) = object.get("id").and_then(Value::as_u64) {
            let method = self
                .pending
                .remove(&id)
                .ok_or(CortexAgentError::UnknownRequestId(id))?;

            if let Some(error) = object.get("error") {
                return Ok(CortexNotification::ErrorReceived {
                    method: method.to_string(),
                    code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                    message: text_of(error.get("message")),
                });
            }

            // The call is answered even when its result is unusable
            let result = object.get("result").cloned().unwrap_or(Value::Null);
            return Ok(decode_result(method, result).unwrap_or_else(|e| {
                CortexNotification::ErrorReceived {
                    method: method.to_string(),
                    code: 0,
                    message: e.to_string(),
                }
            }));
        }

        if let Some(warning) = object.get("warning") {
            return Ok(CortexNotification::Warning {
                code: warning.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: text_of(warning.get("message")),
            });
        }

        if let Some(sid) = object.get("sid").and_then(Value::as_str) {
            return decode_stream_data(sid, object);
        }

        Err(CortexAgentError::UnableToDecodeReceivedData(format!(
            "unrecognized frame: {}",
            text
        )))
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn missing(method: &str, field: &str) -> CortexAgentError {
    CortexAgentError::UnableToDecodeReceivedData(format!("{} reply without '{}'", method, field))
}

fn decode_result(method: &'static str, result: Value) -> Result<CortexNotification> {
    let reply = match method {
        "getUserLogin" => CortexReply::UserLogin {
            usernames: result
                .as_array()
                .map(|users| {
                    users
                        .iter()
                        .filter_map(|u| u.get("username").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        },
        "requestAccess" => CortexReply::AccessRequested {
            granted: result
                .get("accessGranted")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            message: text_of(result.get("message")),
        },
        "authorize" => CortexReply::Authorized {
            token: result
                .get("cortexToken")
                .and_then(Value::as_str)
                .ok_or_else(|| missing(method, "cortexToken"))?
                .to_string(),
        },
        "queryHeadsets" => {
            let headsets: Vec<Headset> = serde_json::from_value(result)?;
            CortexReply::HeadsetsQueried(headsets)
        }
        "controlDevice" => CortexReply::DeviceControlled {
            command: text_of(result.get("command")),
            message: text_of(result.get("message")),
        },
        "createSession" => CortexReply::SessionCreated {
            session_id: result
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| missing(method, "id"))?
                .to_string(),
        },
        "getDetectionInfo" => CortexReply::DetectionInfo {
            actions: string_list(result.get("actions")),
            controls: string_list(result.get("controls")),
            events: string_list(result.get("events")),
        },
        "subscribe" => return decode_subscribe(result),
        "training" => CortexReply::Trained {
            message: text_of(result.get("message")),
        },
        other => {
            return Err(CortexAgentError::UnableToDecodeReceivedData(format!(
                "no decoder for {} replies",
                other
            )))
        }
    };
    Ok(CortexNotification::Reply(reply))
}

fn decode_subscribe(result: Value) -> Result<CortexNotification> {
    let success = result
        .get("success")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let failure = result
        .get("failure")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if let Some(stream) = success.first() {
        return Ok(CortexNotification::Reply(CortexReply::Subscribed {
            stream: text_of(stream.get("streamName")),
            sid: text_of(stream.get("sid")),
        }));
    }

    match failure.first() {
        Some(failed) => Ok(CortexNotification::ErrorReceived {
            method: "subscribe".to_string(),
            code: failed.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: text_of(failed.get("message")),
        }),
        None => Err(missing("subscribe", "success")),
    }
}

fn decode_stream_data(sid: &str, object: &Map<String, Value>) -> Result<CortexNotification> {
    let (stream, fields) = object
        .iter()
        .find(|(key, value)| key.as_str() != "sid" && key.as_str() != "time" && value.is_array())
        .ok_or_else(|| {
            CortexAgentError::UnableToDecodeReceivedData(format!("stream data for {} without payload", sid))
        })?;

    Ok(CortexNotification::StreamData {
        session_id: sid.to_string(),
        stream: stream.clone(),
        time: object.get("time").and_then(Value::as_f64).unwrap_or_default(),
        fields: string_list(Some(fields)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::HeadsetStatus;

    fn sent_id(frame: &str) -> u64 {
        serde_json::from_str::<Value>(frame).unwrap()["id"].as_u64().unwrap()
    }

    #[test]
    fn test_ids_increase_and_are_tracked() {
        let mut codec = RpcCodec::new();
        let first = sent_id(&codec.encode(&CortexRequest::QueryHeadsets));
        let second = sent_id(&codec.encode(&CortexRequest::GetUserLogin));
        assert!(second > first);
        assert_eq!(codec.pending_count(), 2);
    }

    #[test]
    fn test_reply_is_typed_by_remembered_method() {
        let mut codec = RpcCodec::new();
        let id = sent_id(&codec.encode(&CortexRequest::GetDetectionInfo {
            detection: "mentalCommand".to_string(),
        }));
        let frame = json!({
            "id": id,
            "jsonrpc": "2.0",
            "result": {"actions": ["neutral", "push"], "controls": ["start"], "events": ["MC_Started"]}
        });

        let notification = codec.decode(&frame.to_string()).unwrap();

        assert_eq!(
            notification,
            CortexNotification::Reply(CortexReply::DetectionInfo {
                actions: vec!["neutral".to_string(), "push".to_string()],
                controls: vec!["start".to_string()],
                events: vec!["MC_Started".to_string()],
            })
        );
        assert_eq!(codec.pending_count(), 0);
    }

    #[test]
    fn test_error_reply_carries_method() {
        let mut codec = RpcCodec::new();
        let id = sent_id(&codec.encode(&CortexRequest::QueryHeadsets));
        let frame = json!({"id": id, "error": {"code": -32002, "message": "Invalid license"}});

        match codec.decode(&frame.to_string()).unwrap() {
            CortexNotification::ErrorReceived { method, code, message } => {
                assert_eq!(method, "queryHeadsets");
                assert_eq!(code, -32002);
                assert_eq!(message, "Invalid license");
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_failure_is_an_error() {
        let mut codec = RpcCodec::new();
        let id = sent_id(&codec.encode(&CortexRequest::Subscribe {
            token: "t".to_string(),
            session_id: "s".to_string(),
            streams: vec!["sys".to_string()],
        }));
        let frame = json!({"id": id, "result": {
            "success": [],
            "failure": [{"streamName": "sys", "code": -32016, "message": "Stream unavailable"}]
        }});

        assert!(matches!(
            codec.decode(&frame.to_string()).unwrap(),
            CortexNotification::ErrorReceived { code: -32016, .. }
        ));
    }

    #[test]
    fn test_subscribe_success() {
        let mut codec = RpcCodec::new();
        let id = sent_id(&codec.encode(&CortexRequest::Subscribe {
            token: "t".to_string(),
            session_id: "s".to_string(),
            streams: vec!["sys".to_string()],
        }));
        let frame = json!({"id": id, "result": {
            "success": [{"streamName": "sys", "cols": [], "sid": "s"}],
            "failure": []
        }});

        assert_eq!(
            codec.decode(&frame.to_string()).unwrap(),
            CortexNotification::Reply(CortexReply::Subscribed {
                stream: "sys".to_string(),
                sid: "s".to_string(),
            })
        );
    }

    #[test]
    fn test_headsets_are_parsed() {
        let mut codec = RpcCodec::new();
        let id = sent_id(&codec.encode(&CortexRequest::QueryHeadsets));
        let frame = json!({"id": id, "result": [
            {"id": "INSIGHT-1234", "status": "connected", "connectedBy": "dongle", "firmware": "930"}
        ]});

        match codec.decode(&frame.to_string()).unwrap() {
            CortexNotification::Reply(CortexReply::HeadsetsQueried(headsets)) => {
                assert_eq!(headsets.len(), 1);
                assert_eq!(headsets[0].id, "INSIGHT-1234");
                assert_eq!(headsets[0].status, HeadsetStatus::Connected);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn test_stream_data_with_non_string_members() {
        let mut codec = RpcCodec::new();
        let frame = json!({"sid": "s1", "time": 1559902873.9, "sys": ["mentalCommand", 7, "MC_Succeeded"]});

        assert_eq!(
            codec.decode(&frame.to_string()).unwrap(),
            CortexNotification::StreamData {
                session_id: "s1".to_string(),
                stream: "sys".to_string(),
                time: 1559902873.9,
                fields: vec![
                    "mentalCommand".to_string(),
                    String::new(),
                    "MC_Succeeded".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_warning() {
        let mut codec = RpcCodec::new();
        let frame = json!({"warning": {"code": 142, "message": {"headsetId": "X"}}});
        assert!(matches!(
            codec.decode(&frame.to_string()).unwrap(),
            CortexNotification::Warning { code: 142, .. }
        ));
    }

    #[test]
    fn test_unknown_id_and_garbage_are_errors() {
        let mut codec = RpcCodec::new();
        let err = codec.decode(r#"{"id": 99, "result": {}}"#).unwrap_err();
        assert!(matches!(err, CortexAgentError::UnknownRequestId(99)));

        assert!(matches!(codec.decode("not json"), Err(CortexAgentError::Json(_))));
        assert!(matches!(
            codec.decode("[1, 2]"),
            Err(CortexAgentError::UnableToDecodeReceivedData(_))
        ));
    }

    #[test]
    fn test_malformed_headset_reply_still_answers_the_call() {
        let mut codec = RpcCodec::new();
        let id = sent_id(&codec.encode(&CortexRequest::QueryHeadsets));
        let frame = json!({"id": id, "result": [{"id": "INSIGHT-1"}]});

        match codec.decode(&frame.to_string()).unwrap() {
            CortexNotification::ErrorReceived { method, code, message } => {
                assert_eq!(method, "queryHeadsets");
                assert_eq!(code, 0);
                assert!(message.contains("status"), "message: {}", message);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
        assert_eq!(codec.pending_count(), 0);
    }

    #[test]
    fn test_authorize_reply_without_token_is_an_error() {
        let mut codec = RpcCodec::new();
        let id = sent_id(&codec.encode(&CortexRequest::Authorize {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            license: String::new(),
            debit: 0,
        }));
        let frame = json!({"id": id, "result": {"warning": {}}});

        assert!(matches!(
            codec.decode(&frame.to_string()).unwrap(),
            CortexNotification::ErrorReceived { ref method, code: 0, .. } if method == "authorize"
        ));
    }
}
