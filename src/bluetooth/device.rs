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

//! Peer device and adapter state types.

use serde::{Deserialize, Serialize};

/// Bonding state of a peer as reported by the radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BondState {
    #[default]
    None,
    Bonding,
    Bonded,
}

/// Power lifecycle of the local adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    TurningOn,
    On,
    TurningOff,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::Off => "off",
            PowerState::TurningOn => "turning on",
            PowerState::On => "on",
            PowerState::TurningOff => "turning off",
        }
    }
}

/// Presentation grouping of a device in a scan list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Already bonded with this host.
    Paired,
    /// Seen during discovery but not bonded.
    Available,
}

/// A nearby peer.
///
/// The address is the stable identity. The name is optional because the
/// radio stack does not always resolve one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub address: String,
    pub name: Option<String>,
    pub bond_state: BondState,
}

impl Device {
    pub fn new(address: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            address: address.into(),
            name: name.map(str::to_string),
            bond_state: BondState::None,
        }
    }

    pub fn with_bond_state(mut self, bond_state: BondState) -> Self {
        self.bond_state = bond_state;
        self
    }

    pub fn kind(&self) -> DeviceKind {
        match self.bond_state {
            BondState::Bonded => DeviceKind::Paired,
            _ => DeviceKind::Available,
        }
    }

    /// Name for user-facing messages, falling back to the address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }
}
