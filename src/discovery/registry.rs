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

//! Deduplicated, insertion-ordered set of devices for one discovery session.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bluetooth::Device;

/// Field used to decide whether two devices are the same peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// Stable hardware address.
    #[default]
    Address,
    /// Display name. Distinct peers sharing a name collapse into one entry.
    Name,
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    key: DedupKey,
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new(key: DedupKey) -> Self {
        Self {
            key,
            devices: Vec::new(),
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        self.key
    }

    fn key_of<'a>(&self, device: &'a Device) -> Option<&'a str> {
        match self.key {
            DedupKey::Address => Some(device.address.as_str()),
            DedupKey::Name => device.name.as_deref(),
        }
    }

    /// Add a device unless it has no name or its key is already present.
    ///
    /// Returns whether the device was added.
    pub fn insert(&mut self, device: Device) -> bool {
        if !device.has_name() {
            debug!("Ignoring unnamed device {}", device.address);
            return false;
        }

        let key = self.key_of(&device);
        if self.devices.iter().any(|known| self.key_of(known) == key) {
            debug!("Ignoring duplicate device {}", device.address);
            return false;
        }

        self.devices.push(device);
        true
    }

    /// Pre-populate with already bonded devices. Returns how many were added.
    pub fn seed(&mut self, bonded: impl IntoIterator<Item = Device>) -> usize {
        bonded
            .into_iter()
            .map(|device| self.insert(device))
            .filter(|added| *added)
            .count()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn get(&self, address: &str) -> Option<&Device> {
        self.devices.iter().find(|device| device.address == address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
