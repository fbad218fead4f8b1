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

//! Capability interface of the platform radio stack.
//!
//! The radio stack owns the adapter, performs bonding and service discovery,
//! and reports everything that happens as [`RadioEvent`]s. Operations only
//! *request* work; their outcome arrives later as a notification.

use async_trait::async_trait;
use uuid::Uuid;

use super::device::{Device, PowerState};
use crate::error::RadioError;

/// Notifications delivered by the radio stack.
///
/// Device payloads are optional: a platform may deliver a notification
/// without the device it refers to, and such events are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    /// Adapter power changed. The new state is read back from the radio.
    PowerChanged,
    DiscoveryStarted,
    DiscoveryFinished,
    DeviceFound { device: Option<Device> },
    /// Bond state changed. The new state is carried in `device.bond_state`.
    BondStateChanged { device: Option<Device> },
    LinkConnected { device: Option<Device> },
    LinkDisconnected { device: Option<Device> },
    /// Service discovery answered with the advertised service identifiers,
    /// in the order the radio stack reported them.
    ServicesResolved {
        device: Option<Device>,
        services: Option<Vec<Uuid>>,
    },
}

impl RadioEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RadioEvent::PowerChanged => "power-changed",
            RadioEvent::DiscoveryStarted => "discovery-started",
            RadioEvent::DiscoveryFinished => "discovery-finished",
            RadioEvent::DeviceFound { .. } => "device-found",
            RadioEvent::BondStateChanged { .. } => "bond-state-changed",
            RadioEvent::LinkConnected { .. } => "link-connected",
            RadioEvent::LinkDisconnected { .. } => "link-disconnected",
            RadioEvent::ServicesResolved { .. } => "services-resolved",
        }
    }
}

/// Operations the orchestrator may ask of the radio stack.
///
/// Every operation is fallible: a platform lacking a capability returns
/// [`RadioError::Unsupported`].
#[async_trait]
pub trait Radio: Send + Sync {
    async fn power_state(&self) -> Result<PowerState, RadioError>;

    /// Power the adapter off.
    async fn disable(&self) -> Result<(), RadioError>;

    async fn start_discovery(&self) -> Result<(), RadioError>;

    async fn cancel_discovery(&self) -> Result<(), RadioError>;

    async fn is_discovering(&self) -> Result<bool, RadioError>;

    /// Devices already bonded with this host.
    async fn bonded_devices(&self) -> Result<Vec<Device>, RadioError>;

    /// Look up a device the radio stack already knows about.
    async fn device(&self, address: &str) -> Result<Option<Device>, RadioError>;

    /// Authentication secret offered when the peer asks for one.
    async fn set_pairing_secret(&self, address: &str, secret: &str) -> Result<(), RadioError>;

    async fn create_bond(&self, address: &str) -> Result<(), RadioError>;

    async fn remove_bond(&self, address: &str) -> Result<(), RadioError>;

    /// Request service discovery; answered by [`RadioEvent::ServicesResolved`].
    async fn fetch_services(&self, address: &str) -> Result<(), RadioError>;

    /// Open a connection to one service of the device. `Ok` means connected.
    async fn connect_service(&self, address: &str, service: Uuid) -> Result<(), RadioError>;
}
