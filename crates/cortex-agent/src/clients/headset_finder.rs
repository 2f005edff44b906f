// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tracing::{debug, info};

use super::{CortexConnection, HeadsetDiscovery};
use crate::common::{Headset, HeadsetStatus};
use crate::protocol::{CortexReply, CortexRequest};
use crate::Result;

/// Polls `queryHeadsets` until the first headset is connected
///
/// A discovered headset is asked to connect once; polling resumes after
/// each reply so only one request is ever outstanding.
#[derive(Debug, Clone)]
pub struct HeadsetFinder {
    query_interval: Duration,
    active: bool,
    connect_requested: bool,
    reported_empty: bool,
}

impl HeadsetFinder {
    pub fn new(query_interval: Duration) -> Self {
        Self {
            query_interval,
            active: false,
            connect_requested: false,
            reported_empty: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn query_later(&self, connection: &mut dyn CortexConnection) -> Result<()> {
        connection.send_after(CortexRequest::QueryHeadsets, self.query_interval)
    }
}

impl Default for HeadsetFinder {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl HeadsetDiscovery for HeadsetFinder {
    fn find_headsets(&mut self, connection: &mut dyn CortexConnection) -> Result<()> {
        self.active = true;
        self.connect_requested = false;
        self.reported_empty = false;
        connection.send(CortexRequest::QueryHeadsets)
    }

    fn on_reply(
        &mut self,
        reply: &CortexReply,
        connection: &mut dyn CortexConnection,
    ) -> Result<Option<Vec<Headset>>> {
        if !self.active {
            return Ok(None);
        }

        match reply {
            CortexReply::HeadsetsQueried(headsets) => match headsets.first() {
                None => {
                    if !self.reported_empty {
                        info!("No headset found, please connect a headset.");
                        self.reported_empty = true;
                    }
                    self.query_later(connection)?;
                    Ok(None)
                }
                Some(headset) if headset.is_connected() => {
                    info!("[DISCOVERY] Headset {} connected", headset.id);
                    self.active = false;
                    Ok(Some(headsets.clone()))
                }
                Some(headset) => {
                    if headset.status == HeadsetStatus::Discovered && !self.connect_requested {
                        info!("[DISCOVERY] Connecting headset {}", headset.id);
                        self.connect_requested = true;
                        connection.send(CortexRequest::ControlDevice {
                            command: "connect".to_string(),
                            headset_id: headset.id.clone(),
                        })?;
                    } else {
                        debug!("[DISCOVERY] Headset {} is {:?}", headset.id, headset.status);
                        self.query_later(connection)?;
                    }
                    Ok(None)
                }
            },
            CortexReply::DeviceControlled { command, message } => {
                debug!("[DISCOVERY] controlDevice {}: {}", command, message);
                self.query_later(connection)?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn clear(&mut self) {
        self.active = false;
    }
}
