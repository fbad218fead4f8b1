// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Discovery session state machine.
//!
//! The session does not talk to the radio or to observers. Each transition
//! returns the [`ScanEvent`]s the orchestrator has to deliver.

use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use super::registry::{DedupKey, DeviceRegistry};
use crate::bluetooth::Device;

/// Default time after which a running scan is force-finished.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Finished,
}

/// Observer-facing outcome of a session transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Started,
    /// The full device list after a new device was added.
    DeviceFound(Vec<Device>),
    FinishedWithDevices,
    FinishedEmpty,
}

#[derive(Debug)]
pub struct DiscoverySession {
    phase: ScanPhase,
    started_at: Option<Instant>,
    timeout: Duration,
    registry: DeviceRegistry,
}

impl DiscoverySession {
    pub fn new(timeout: Duration, dedup_key: DedupKey) -> Self {
        Self {
            phase: ScanPhase::Idle,
            started_at: None,
            timeout,
            registry: DeviceRegistry::new(dedup_key),
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn is_scanning(&self) -> bool {
        self.phase == ScanPhase::Scanning
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Instant at which a running scan times out.
    pub fn deadline(&self) -> Option<Instant> {
        match (self.phase, self.started_at) {
            (ScanPhase::Scanning, Some(started_at)) => Some(started_at + self.timeout),
            _ => None,
        }
    }

    /// Begin a new scan seeded with the already bonded devices.
    ///
    /// A start while already scanning is a duplicate notification and is
    /// ignored.
    pub fn start(&mut self, bonded: Vec<Device>, now: Instant) -> Option<ScanEvent> {
        if self.phase == ScanPhase::Scanning {
            debug!("Discovery already running, ignoring start");
            return None;
        }

        self.registry.clear();
        let seeded = self.registry.seed(bonded);
        self.phase = ScanPhase::Scanning;
        self.started_at = Some(now);
        info!("Discovery started with {} bonded devices", seeded);
        Some(ScanEvent::Started)
    }

    /// Record a found device. Devices reported outside a running scan are
    /// rejected.
    pub fn device_found(&mut self, device: Device, now: Instant) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        if self.phase != ScanPhase::Scanning {
            debug!("Device {} found outside a scan, ignoring", device.address);
            return events;
        }

        if self.registry.insert(device) {
            events.push(ScanEvent::DeviceFound(self.registry.devices().to_vec()));
        }

        if self.is_timed_out(now) {
            info!("Discovery timed out");
            events.extend(self.finish());
        }
        events
    }

    pub fn is_timed_out(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Finish the running scan. Idempotent: only the first call after a start
    /// reports an outcome.
    pub fn finish(&mut self) -> Option<ScanEvent> {
        if self.phase != ScanPhase::Scanning {
            return None;
        }

        self.phase = ScanPhase::Finished;
        info!("Discovery finished with {} devices", self.registry.len());
        if self.registry.is_empty() {
            Some(ScanEvent::FinishedEmpty)
        } else {
            Some(ScanEvent::FinishedWithDevices)
        }
    }
}
