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

//! Pairing and unpairing progress for one device at a time.

use tracing::{debug, info, warn};

use crate::action::{Action, ActionArbiter};
use crate::bluetooth::{BondState, Device};
use crate::error::LifecycleError;

/// Default authentication secret offered while bonding.
pub const DEFAULT_PAIRING_SECRET: &str = "0000";

/// Where a pairing workflow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStage {
    /// Bond or unbond request issued, nothing heard back yet.
    Requested,
    /// Radio reported bonding in progress.
    Bonding,
    /// Peer is prompting the user out-of-band.
    AwaitingAuthorization,
}

/// Observer-facing outcome of a pairing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingEvent {
    Started,
    WaitingForAuthorization,
    Paired,
    /// Bond removed, or bonding failed. `last_action` tells the two apart.
    Unpaired { last_action: Action },
}

#[derive(Debug)]
struct PairingTarget {
    address: String,
    stage: PairingStage,
}

/// Tracks the device targeted by the active pair or unpair action.
#[derive(Debug, Default)]
pub struct PairingSession {
    target: Option<PairingTarget>,
}

impl PairingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_ref().map(|target| target.address.as_str())
    }

    pub fn stage(&self) -> Option<PairingStage> {
        self.target.as_ref().map(|target| target.stage)
    }

    /// Claim the arbiter for pairing `device`.
    pub fn pair(&mut self, arbiter: &mut ActionArbiter, device: &Device) -> Result<(), LifecycleError> {
        arbiter.begin_pair()?;
        self.track(device);
        Ok(())
    }

    /// Claim the arbiter for removing the bond with `device`.
    pub fn unpair(&mut self, arbiter: &mut ActionArbiter, device: &Device) -> Result<(), LifecycleError> {
        arbiter.begin_unpair()?;
        self.track(device);
        Ok(())
    }

    fn track(&mut self, device: &Device) {
        self.target = Some(PairingTarget {
            address: device.address.clone(),
            stage: PairingStage::Requested,
        });
    }

    /// Release the action after the radio refused the request.
    pub fn abandon(&mut self, arbiter: &mut ActionArbiter) {
        if self.target.take().is_some() && arbiter.current().is_bonding() {
            warn!("Pairing request was not accepted by the radio, releasing action");
            arbiter.complete();
        }
    }

    /// Whether bond and link notifications for `device` belong to the
    /// active workflow.
    fn owns(&self, arbiter: &ActionArbiter, device: &Device) -> bool {
        arbiter.current().is_bonding()
            && self
                .target
                .as_ref()
                .is_some_and(|target| target.address == device.address)
    }

    pub fn on_bond_state(&mut self, arbiter: &mut ActionArbiter, device: &Device) -> Option<PairingEvent> {
        if !self.owns(arbiter, device) {
            debug!(
                "Bond state {:?} for {} outside a pairing workflow, ignoring",
                device.bond_state, device.address
            );
            return None;
        }

        match device.bond_state {
            BondState::Bonding => {
                if let Some(target) = self.target.as_mut() {
                    target.stage = PairingStage::Bonding;
                }
                info!("Bonding with {}", device.address);
                Some(PairingEvent::Started)
            }
            BondState::Bonded => {
                self.target = None;
                arbiter.complete();
                info!("Bonded with {}", device.address);
                Some(PairingEvent::Paired)
            }
            BondState::None => {
                self.target = None;
                let last_action = arbiter.complete();
                info!(
                    "Bond with {} removed (last action: {})",
                    device.address,
                    last_action.as_str()
                );
                Some(PairingEvent::Unpaired { last_action })
            }
        }
    }

    pub fn on_link_connected(&mut self, arbiter: &ActionArbiter, device: &Device) -> Option<PairingEvent> {
        if !self.owns(arbiter, device) {
            return None;
        }

        if let Some(target) = self.target.as_mut() {
            target.stage = PairingStage::AwaitingAuthorization;
        }
        info!("Waiting for {} to authorize pairing", device.address);
        Some(PairingEvent::WaitingForAuthorization)
    }
}
