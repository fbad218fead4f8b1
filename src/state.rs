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

//! Application state management.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::action::Action;
use crate::bluetooth::Device;
use crate::observer::{
    ConnectionObserver, FollowedDeviceObserver, PairingObserver, PowerObserver, ScanObserver,
};

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "Idle",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Failed => "Failed",
        }
    }
}

/// Pairing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStatus {
    Idle,
    Pairing,
    AwaitingAuthorization,
    Paired,
    Unpaired,
}

/// Shared application state, kept current by [`StatusObserver`].
#[derive(Debug)]
pub struct AppState {
    pub enabled: RwLock<Option<bool>>,
    pub scanning: RwLock<bool>,
    pub devices: RwLock<Vec<Device>>,
    pub pairing_status: RwLock<PairingStatus>,
    pub connection_status: RwLock<ConnectionStatus>,

    /// Name of the followed device while it is connected.
    pub followed_connected: RwLock<Option<String>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            enabled: RwLock::new(None),
            scanning: RwLock::new(false),
            devices: RwLock::new(Vec::new()),
            pairing_status: RwLock::new(PairingStatus::Idle),
            connection_status: RwLock::new(ConnectionStatus::Idle),
            followed_connected: RwLock::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_scanning(&self) -> bool {
        *self.scanning.read()
    }

    pub fn get_devices(&self) -> Vec<Device> {
        self.devices.read().clone()
    }

    pub fn get_pairing_status(&self) -> PairingStatus {
        *self.pairing_status.read()
    }

    pub fn get_connection_status(&self) -> ConnectionStatus {
        *self.connection_status.read()
    }

    pub fn get_followed_connected(&self) -> Option<String> {
        self.followed_connected.read().clone()
    }

    pub fn is_enabled(&self) -> Option<bool> {
        *self.enabled.read()
    }
}

/// Observer that logs every lifecycle callback and records it in [`AppState`].
pub struct StatusObserver {
    state: Arc<AppState>,
}

impl StatusObserver {
    pub fn new(state: Arc<AppState>) -> Arc<Self> {
        Arc::new(Self { state })
    }
}

impl ScanObserver for StatusObserver {
    fn on_scan_started(&self) {
        info!("Scan started");
        *self.state.scanning.write() = true;
        self.state.devices.write().clear();
    }

    fn on_device_found(&self, devices: &[Device]) {
        if let Some(device) = devices.last() {
            info!(
                "Found {} [{}] ({} devices)",
                device.display_name(),
                device.address,
                devices.len()
            );
        }
        *self.state.devices.write() = devices.to_vec();
    }

    fn on_scan_finished_with_devices(&self) {
        info!("Scan finished with {} devices", self.state.devices.read().len());
        *self.state.scanning.write() = false;
    }

    fn on_scan_finished_without_devices(&self) {
        info!("Scan finished, no devices found");
        *self.state.scanning.write() = false;
    }
}

impl PairingObserver for StatusObserver {
    fn on_pairing_started(&self) {
        info!("Pairing started");
        *self.state.pairing_status.write() = PairingStatus::Pairing;
    }

    fn on_waiting_for_authorization(&self) {
        info!("Waiting for authorization on the peer");
        *self.state.pairing_status.write() = PairingStatus::AwaitingAuthorization;
    }

    fn on_paired(&self) {
        info!("Paired");
        *self.state.pairing_status.write() = PairingStatus::Paired;
    }

    fn on_unpaired(&self, last_action: Action) {
        match last_action {
            Action::Pair => info!("Pairing failed"),
            _ => info!("Unpaired"),
        }
        *self.state.pairing_status.write() = PairingStatus::Unpaired;
    }
}

impl ConnectionObserver for StatusObserver {
    fn on_connection_started(&self) {
        info!("Connecting...");
        *self.state.connection_status.write() = ConnectionStatus::Connecting;
    }

    fn on_connection_succeeded(&self) {
        info!("Connection succeeded");
        *self.state.connection_status.write() = ConnectionStatus::Connected;
    }

    fn on_connection_failed(&self) {
        info!("Connection failed");
        *self.state.connection_status.write() = ConnectionStatus::Failed;
    }
}

impl FollowedDeviceObserver for StatusObserver {
    fn on_device_connected(&self, name: &str) {
        info!("Followed device {} connected", name);
        *self.state.followed_connected.write() = Some(name.to_string());
    }

    fn on_device_disconnected(&self, name: &str) {
        info!("Followed device {} disconnected", name);
        *self.state.followed_connected.write() = None;
    }
}

impl PowerObserver for StatusObserver {
    fn on_enabled(&self) {
        info!("Bluetooth enabled");
        *self.state.enabled.write() = Some(true);
    }

    fn on_disabled(&self) {
        info!("Bluetooth disabled");
        *self.state.enabled.write() = Some(false);
    }
}
