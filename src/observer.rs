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

//! Observer callbacks.
//!
//! Five independent groups. Each is optional and registered once, when the
//! orchestrator is built.

use std::sync::Arc;

use crate::action::Action;
use crate::bluetooth::Device;

pub trait ScanObserver: Send + Sync {
    fn on_scan_started(&self);
    /// Called with the full device list each time a new device is added.
    fn on_device_found(&self, devices: &[Device]);
    fn on_scan_finished_with_devices(&self);
    fn on_scan_finished_without_devices(&self);
}

pub trait PairingObserver: Send + Sync {
    fn on_pairing_started(&self);
    fn on_waiting_for_authorization(&self);
    fn on_paired(&self);
    /// `last_action` is `Pair` when bonding failed or was cancelled and
    /// `Unpair` when an explicit unpair succeeded.
    fn on_unpaired(&self, last_action: Action);
}

pub trait ConnectionObserver: Send + Sync {
    fn on_connection_started(&self);
    fn on_connection_succeeded(&self);
    fn on_connection_failed(&self);
}

pub trait FollowedDeviceObserver: Send + Sync {
    fn on_device_connected(&self, name: &str);
    fn on_device_disconnected(&self, name: &str);
}

pub trait PowerObserver: Send + Sync {
    fn on_enabled(&self);
    fn on_disabled(&self);
}

/// Registered observers.
#[derive(Clone, Default)]
pub struct Observers {
    pub scan: Option<Arc<dyn ScanObserver>>,
    pub pairing: Option<Arc<dyn PairingObserver>>,
    pub connection: Option<Arc<dyn ConnectionObserver>>,
    pub followed: Option<Arc<dyn FollowedDeviceObserver>>,
    pub power: Option<Arc<dyn PowerObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.scan = Some(observer);
        self
    }

    pub fn with_pairing(mut self, observer: Arc<dyn PairingObserver>) -> Self {
        self.pairing = Some(observer);
        self
    }

    pub fn with_connection(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.connection = Some(observer);
        self
    }

    pub fn with_followed(mut self, observer: Arc<dyn FollowedDeviceObserver>) -> Self {
        self.followed = Some(observer);
        self
    }

    pub fn with_power(mut self, observer: Arc<dyn PowerObserver>) -> Self {
        self.power = Some(observer);
        self
    }

    /// Register one observer for every group.
    pub fn all<T>(observer: Arc<T>) -> Self
    where
        T: ScanObserver
            + PairingObserver
            + ConnectionObserver
            + FollowedDeviceObserver
            + PowerObserver
            + 'static,
    {
        Self {
            scan: Some(observer.clone()),
            pairing: Some(observer.clone()),
            connection: Some(observer.clone()),
            followed: Some(observer.clone()),
            power: Some(observer),
        }
    }
}
