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

//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use peerlink::action::Action;
use peerlink::bluetooth::{Device, PowerState, Radio};
use peerlink::observer::{
    ConnectionObserver, FollowedDeviceObserver, Observers, PairingObserver, PowerObserver,
    ScanObserver,
};
use peerlink::RadioError;

#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Succeed,
    Fail,
    Hang,
}

/// Scriptable radio recording every operation it is asked to perform.
pub struct FakeRadio {
    pub power: Mutex<PowerState>,
    pub discovering: Mutex<bool>,
    pub bonded: Mutex<Vec<Device>>,
    pub known: Mutex<Vec<Device>>,
    pub services: Mutex<HashMap<Uuid, Behaviour>>,
    pub fail_create_bond: Mutex<bool>,
    pub fail_fetch_services: Mutex<bool>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRadio {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            power: Mutex::new(PowerState::On),
            discovering: Mutex::new(false),
            bonded: Mutex::new(Vec::new()),
            known: Mutex::new(Vec::new()),
            services: Mutex::new(HashMap::new()),
            fail_create_bond: Mutex::new(false),
            fail_fetch_services: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn know(&self, device: &Device) {
        self.known.lock().push(device.clone());
    }

    pub fn service(&self, service: Uuid, behaviour: Behaviour) {
        self.services.lock().insert(service, behaviour);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Radio for FakeRadio {
    async fn power_state(&self) -> Result<PowerState, RadioError> {
        Ok(*self.power.lock())
    }

    async fn disable(&self) -> Result<(), RadioError> {
        self.record("disable".to_string());
        Ok(())
    }

    async fn start_discovery(&self) -> Result<(), RadioError> {
        self.record("start_discovery".to_string());
        *self.discovering.lock() = true;
        Ok(())
    }

    async fn cancel_discovery(&self) -> Result<(), RadioError> {
        self.record("cancel_discovery".to_string());
        *self.discovering.lock() = false;
        Ok(())
    }

    async fn is_discovering(&self) -> Result<bool, RadioError> {
        Ok(*self.discovering.lock())
    }

    async fn bonded_devices(&self) -> Result<Vec<Device>, RadioError> {
        Ok(self.bonded.lock().clone())
    }

    async fn device(&self, address: &str) -> Result<Option<Device>, RadioError> {
        Ok(self
            .known
            .lock()
            .iter()
            .find(|device| device.address == address)
            .cloned())
    }

    async fn set_pairing_secret(&self, address: &str, secret: &str) -> Result<(), RadioError> {
        self.record(format!("set_pairing_secret:{}:{}", address, secret));
        Ok(())
    }

    async fn create_bond(&self, address: &str) -> Result<(), RadioError> {
        self.record(format!("create_bond:{}", address));
        if *self.fail_create_bond.lock() {
            return Err(RadioError::Unsupported("create bond"));
        }
        Ok(())
    }

    async fn remove_bond(&self, address: &str) -> Result<(), RadioError> {
        self.record(format!("remove_bond:{}", address));
        Ok(())
    }

    async fn fetch_services(&self, address: &str) -> Result<(), RadioError> {
        self.record(format!("fetch_services:{}", address));
        if *self.fail_fetch_services.lock() {
            return Err(RadioError::Backend("service discovery unavailable".to_string()));
        }
        Ok(())
    }

    async fn connect_service(&self, address: &str, service: Uuid) -> Result<(), RadioError> {
        self.record(format!("connect:{}:{}", address, service));
        let behaviour = self
            .services
            .lock()
            .get(&service)
            .copied()
            .unwrap_or(Behaviour::Fail);
        match behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(RadioError::Backend("connection refused".to_string())),
            Behaviour::Hang => std::future::pending().await,
        }
    }
}

/// Observer recording every callback as a short string.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn observers(self: &Arc<Self>) -> Observers {
        Observers::all(self.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl ScanObserver for Recorder {
    fn on_scan_started(&self) {
        self.record("scan_started");
    }

    fn on_device_found(&self, devices: &[Device]) {
        let names: Vec<&str> = devices.iter().map(Device::display_name).collect();
        self.record(format!("device_found:{}", names.join(",")));
    }

    fn on_scan_finished_with_devices(&self) {
        self.record("finished_with_devices");
    }

    fn on_scan_finished_without_devices(&self) {
        self.record("finished_without_devices");
    }
}

impl PairingObserver for Recorder {
    fn on_pairing_started(&self) {
        self.record("pairing_started");
    }

    fn on_waiting_for_authorization(&self) {
        self.record("waiting_for_authorization");
    }

    fn on_paired(&self) {
        self.record("paired");
    }

    fn on_unpaired(&self, last_action: Action) {
        self.record(format!("unpaired:{}", last_action.as_str()));
    }
}

impl ConnectionObserver for Recorder {
    fn on_connection_started(&self) {
        self.record("connection_started");
    }

    fn on_connection_succeeded(&self) {
        self.record("connection_succeeded");
    }

    fn on_connection_failed(&self) {
        self.record("connection_failed");
    }
}

impl FollowedDeviceObserver for Recorder {
    fn on_device_connected(&self, name: &str) {
        self.record(format!("followed_connected:{}", name));
    }

    fn on_device_disconnected(&self, name: &str) {
        self.record(format!("followed_disconnected:{}", name));
    }
}

impl PowerObserver for Recorder {
    fn on_enabled(&self) {
        self.record("enabled");
    }

    fn on_disabled(&self) {
        self.record("disabled");
    }
}
