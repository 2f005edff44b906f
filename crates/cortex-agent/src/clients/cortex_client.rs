// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Websocket connection to the Cortex service (tokio-tungstenite).
//!
//! One task owns the socket: it connects, then forwards queued frames to the
//! writer half while decoding every inbound text frame into a notification.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::CortexConnection;
use crate::protocol::{CortexNotification, CortexRequest, RpcCodec};
use crate::{CortexAgentError, Result};

#[derive(Debug)]
enum Outbound {
    Frame(String),
    Close,
}

pub struct CortexClient {
    url: String,
    notifications: mpsc::UnboundedSender<CortexNotification>,
    codec: Arc<Mutex<RpcCodec>>,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
}

impl CortexClient {
    /// Notifications are pushed to `notifications` in arrival order
    pub fn new(url: impl Into<String>, notifications: mpsc::UnboundedSender<CortexNotification>) -> Self {
        Self {
            url: url.into(),
            notifications,
            codec: Arc::new(Mutex::new(RpcCodec::new())),
            outbound: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn outbound(&self) -> Result<&mpsc::UnboundedSender<Outbound>> {
        self.outbound.as_ref().ok_or(CortexAgentError::NotConnected)
    }
}

fn queue(
    outbound: &mpsc::UnboundedSender<Outbound>,
    codec: &Mutex<RpcCodec>,
    request: &CortexRequest,
) -> Result<()> {
    let frame = codec.lock().encode(request);
    debug!("[CORTEX-WS] -> {}", frame);
    outbound
        .send(Outbound::Frame(frame))
        .map_err(|_| CortexAgentError::UnableToSendData(format!("{}: connection closed", request.method())))
}

impl CortexConnection for CortexClient {
    fn open(&mut self) -> Result<()> {
        if self.outbound.is_some() {
            return Err(CortexAgentError::Other("connection already opened".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound = Some(tx);

        info!("[CORTEX-WS] Connecting to {}", self.url);
        tokio::spawn(run_connection(
            self.url.clone(),
            rx,
            self.notifications.clone(),
            Arc::clone(&self.codec),
        ));
        Ok(())
    }

    fn send(&mut self, request: CortexRequest) -> Result<()> {
        queue(self.outbound()?, &self.codec, &request)
    }

    fn send_after(&mut self, request: CortexRequest, delay: Duration) -> Result<()> {
        let outbound = self.outbound()?.clone();
        let codec = Arc::clone(&self.codec);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = queue(&outbound, &codec, &request) {
                debug!("[CORTEX-WS] Delayed request dropped: {}", e);
            }
        });
        Ok(())
    }

    fn close(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::Close);
        }
    }
}

async fn run_connection(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    notifications: mpsc::UnboundedSender<CortexNotification>,
    codec: Arc<Mutex<RpcCodec>>,
) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            error!("[CORTEX-WS] Failed to connect to {}: {}", url, e);
            let _ = notifications.send(CortexNotification::ConnectionError(e.to_string()));
            return;
        }
    };
    info!("[CORTEX-WS] Connected to {}", url);
    let _ = notifications.send(CortexNotification::Connected);

    let (mut write, mut read) = ws_stream.split();

    let writer = tokio::spawn(async move {
        while let Some(item) = outbound.recv().await {
            match item {
                Outbound::Frame(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        error!("[CORTEX-WS] Send error: {}", e);
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!("[CORTEX-WS] <- {}", text);
                let decoded = codec.lock().decode(&text);
                match decoded {
                    Ok(notification) => {
                        if notifications.send(notification).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("[CORTEX-WS] Dropping frame: {}", e),
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("[CORTEX-WS] Connection closed");
                let _ = notifications.send(CortexNotification::Disconnected);
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("[CORTEX-WS] Receive error: {}", e);
                let _ = notifications.send(CortexNotification::ConnectionError(e.to_string()));
                break;
            }
        }
    }

    writer.abort();
}
