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

//! Event processing and observer dispatch.
//!
//! The [`Orchestrator`] is the single consumer of radio notifications and
//! user requests. Everything that mutates lifecycle state happens on the task
//! running [`Orchestrator::run`], one event at a time.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::action::{Action, ActionArbiter};
use crate::bluetooth::{Device, PowerState, Radio, RadioEvent};
use crate::config::Config;
use crate::connection::{AttemptLimits, AttemptReport, ConnectionAttempt};
use crate::discovery::{DiscoverySession, ScanEvent, ScanPhase};
use crate::error::LifecycleError;
use crate::followed::{FollowedDeviceMonitor, FollowedEvent, LinkChange};
use crate::observer::Observers;
use crate::pairing::{PairingEvent, PairingSession};
use crate::power::{AdapterPowerMonitor, PowerEvent};
use crate::storage::FollowedDeviceStore;

/// User requests, serialized with radio notifications by [`Orchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    StartScan,
    StopScan,
    Pair(String),
    Unpair(String),
    Connect(String),
    CancelConnection,
    Disable,
}

/// Connect action in flight.
struct PendingConnection {
    device: Device,
    /// Running attempt, once the device's services have been resolved.
    task: Option<JoinHandle<AttemptReport>>,
}

pub struct Orchestrator {
    radio: Arc<dyn Radio>,
    observers: Observers,
    arbiter: ActionArbiter,
    discovery: DiscoverySession,
    pairing: PairingSession,
    followed: FollowedDeviceMonitor,
    power: AdapterPowerMonitor,
    connection: Option<PendingConnection>,
    pairing_secret: String,
    limits: AttemptLimits,
    force_finish_on_timeout: bool,
}

impl Orchestrator {
    pub fn new(
        radio: Arc<dyn Radio>,
        store: Arc<dyn FollowedDeviceStore>,
        config: &Config,
        observers: Observers,
    ) -> Self {
        Self {
            radio,
            observers,
            arbiter: ActionArbiter::new(),
            discovery: DiscoverySession::new(config.discovery.timeout(), config.discovery.dedup_key),
            pairing: PairingSession::new(),
            followed: FollowedDeviceMonitor::new(store),
            power: AdapterPowerMonitor::new(),
            connection: None,
            pairing_secret: config.pairing.secret.clone(),
            limits: config.connection.limits(),
            force_finish_on_timeout: config.discovery.force_finish_on_timeout,
        }
    }

    /// Action currently in flight.
    pub fn action(&self) -> Action {
        self.arbiter.current()
    }

    pub fn scan_phase(&self) -> ScanPhase {
        self.discovery.phase()
    }

    /// Devices of the current or last discovery session.
    pub fn devices(&self) -> &[Device] {
        self.discovery.registry().devices()
    }

    /// Last power state reported by the radio.
    pub fn power_state(&self) -> Option<PowerState> {
        self.power.current()
    }

    // ---- Requests ----

    /// Ask the radio to start discovery. The session starts when the radio
    /// reports that discovery has started.
    pub async fn start_scan(&mut self) {
        if let Err(e) = self.radio.start_discovery().await {
            warn!("Failed to start discovery: {}", e);
        }
    }

    /// Stop the running scan.
    pub async fn stop_scan(&mut self) {
        self.finish_discovery().await;
    }

    /// Cancel radio discovery if it is running.
    pub async fn cancel_discovery(&self) {
        match self.radio.is_discovering().await {
            Ok(true) => {
                if let Err(e) = self.radio.cancel_discovery().await {
                    warn!("Failed to cancel discovery: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Failed to query discovery state: {}", e),
        }
    }

    /// Stop any scan and power the adapter off.
    pub async fn disable(&mut self) {
        self.finish_discovery().await;
        if let Err(e) = self.radio.disable().await {
            warn!("Failed to power off adapter: {}", e);
        }
    }

    pub async fn is_enabled(&self) -> bool {
        match self.radio.power_state().await {
            Ok(state) => state == PowerState::On,
            Err(e) => {
                warn!("Failed to query power state: {}", e);
                false
            }
        }
    }

    /// Bond with `device`. The outcome arrives as bond state notifications.
    pub async fn pair(&mut self, device: &Device) -> Result<(), LifecycleError> {
        self.pairing.pair(&mut self.arbiter, device)?;
        info!("Pairing with {}", device.address);

        if let Err(e) = self
            .radio
            .set_pairing_secret(&device.address, &self.pairing_secret)
            .await
        {
            warn!("Failed to set pairing secret for {}: {}", device.address, e);
        }

        if let Err(e) = self.radio.create_bond(&device.address).await {
            warn!("Failed to request bond with {}: {}", device.address, e);
            self.pairing.abandon(&mut self.arbiter);
        }
        Ok(())
    }

    /// Remove the bond with `device`.
    pub async fn unpair(&mut self, device: &Device) -> Result<(), LifecycleError> {
        self.pairing.unpair(&mut self.arbiter, device)?;
        info!("Unpairing {}", device.address);

        if let Err(e) = self.radio.remove_bond(&device.address).await {
            warn!("Failed to remove bond with {}: {}", device.address, e);
            self.pairing.abandon(&mut self.arbiter);
        }
        Ok(())
    }

    /// Connect the services of an identified device.
    ///
    /// Observers hear `on_connection_started` immediately; the outcome
    /// follows once services are resolved and every candidate was tried.
    pub async fn connect(&mut self, device: &Device) -> Result<(), LifecycleError> {
        if !self.is_identified(&device.address).await {
            return Err(LifecycleError::UnknownDevice(device.address.clone()));
        }

        self.arbiter.begin_connect()?;
        self.connection = Some(PendingConnection {
            device: device.clone(),
            task: None,
        });
        info!("Connecting to {}", device.address);
        if let Some(observer) = &self.observers.connection {
            observer.on_connection_started();
        }

        if let Err(e) = self.radio.fetch_services(&device.address).await {
            warn!("Failed to request services of {}: {}", device.address, e);
            self.finish_connection(false);
        }
        Ok(())
    }

    /// Abort the connect action in flight, reporting it as failed.
    pub fn cancel_connection(&mut self) {
        let Some(pending) = self.connection.as_mut() else {
            return;
        };
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        info!("Connection to {} cancelled", pending.device.address);
        self.finish_connection(false);
    }

    /// Find a device by address: first among discovered devices, then among
    /// those the radio knows.
    pub async fn resolve_device(&self, address: &str) -> Result<Device, LifecycleError> {
        if let Some(device) = self.discovery.registry().get(address) {
            return Ok(device.clone());
        }
        match self.radio.device(address).await {
            Ok(Some(device)) => Ok(device),
            Ok(None) => Err(LifecycleError::UnknownDevice(address.to_string())),
            Err(e) => {
                debug!("Radio lookup of {} failed: {}", address, e);
                Err(LifecycleError::UnknownDevice(address.to_string()))
            }
        }
    }

    async fn is_identified(&self, address: &str) -> bool {
        self.resolve_device(address).await.is_ok()
    }

    pub async fn handle_request(&mut self, request: Request) {
        debug!("Request: {:?}", request);
        let result = match request {
            Request::StartScan => {
                self.start_scan().await;
                Ok(())
            }
            Request::StopScan => {
                self.stop_scan().await;
                Ok(())
            }
            Request::Pair(address) => match self.resolve_device(&address).await {
                Ok(device) => self.pair(&device).await,
                Err(e) => Err(e),
            },
            Request::Unpair(address) => match self.resolve_device(&address).await {
                Ok(device) => self.unpair(&device).await,
                Err(e) => Err(e),
            },
            Request::Connect(address) => match self.resolve_device(&address).await {
                Ok(device) => self.connect(&device).await,
                Err(e) => Err(e),
            },
            Request::CancelConnection => {
                self.cancel_connection();
                Ok(())
            }
            Request::Disable => {
                self.disable().await;
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Request rejected: {}", e);
        }
    }

    // ---- Radio notifications ----

    /// Process a single radio notification.
    pub async fn handle_event(&mut self, event: RadioEvent) {
        debug!("Radio event: {}", event.name());
        match event {
            RadioEvent::PowerChanged => self.on_power_changed().await,
            RadioEvent::DiscoveryStarted => self.on_discovery_started().await,
            RadioEvent::DiscoveryFinished => self.finish_discovery().await,
            RadioEvent::DeviceFound { device: Some(device) } => self.on_device_found(device).await,
            RadioEvent::BondStateChanged { device: Some(device) } => {
                if let Some(event) = self.pairing.on_bond_state(&mut self.arbiter, &device) {
                    self.notify_pairing(event);
                }
            }
            RadioEvent::LinkConnected { device: Some(device) } => {
                if let Some(event) = self.pairing.on_link_connected(&self.arbiter, &device) {
                    self.notify_pairing(event);
                }
                self.on_link_change(LinkChange::Connected, &device);
            }
            RadioEvent::LinkDisconnected { device: Some(device) } => {
                self.on_link_change(LinkChange::Disconnected, &device);
            }
            RadioEvent::ServicesResolved {
                device: Some(device),
                services,
            } => self.on_services_resolved(device, services.unwrap_or_default()),
            event => warn!("Dropping {} notification without a device", event.name()),
        }
    }

    async fn on_power_changed(&mut self) {
        let state = match self.radio.power_state().await {
            Ok(state) => state,
            Err(e) => {
                warn!("Failed to read power state: {}", e);
                return;
            }
        };

        if state == PowerState::Off && self.connection.is_some() {
            self.cancel_connection();
        }

        if let Some(event) = self.power.on_power_state(state) {
            self.notify_power(event);
        }
    }

    async fn on_discovery_started(&mut self) {
        let bonded = match self.radio.bonded_devices().await {
            Ok(bonded) => bonded,
            Err(e) => {
                warn!("Failed to list bonded devices: {}", e);
                Vec::new()
            }
        };

        if let Some(event) = self.discovery.start(bonded, Instant::now()) {
            self.notify_scan(event);
        }
    }

    async fn on_device_found(&mut self, device: Device) {
        let was_scanning = self.discovery.is_scanning();
        let events = self.discovery.device_found(device, Instant::now());
        if was_scanning && !self.discovery.is_scanning() {
            self.cancel_discovery().await;
        }
        for event in events {
            self.notify_scan(event);
        }
    }

    async fn finish_discovery(&mut self) {
        self.cancel_discovery().await;
        if let Some(event) = self.discovery.finish() {
            self.notify_scan(event);
        }
    }

    /// Finish a scan whose deadline has passed without further devices.
    async fn expire_discovery(&mut self) {
        if self.discovery.is_timed_out(Instant::now()) {
            info!("Discovery timed out without further devices");
            self.finish_discovery().await;
        }
    }

    fn on_link_change(&mut self, change: LinkChange, device: &Device) {
        if let Some(event) = self
            .followed
            .on_link_change(change, device, self.arbiter.current())
        {
            self.notify_followed(event);
        }
    }

    fn on_services_resolved(&mut self, device: Device, services: Vec<uuid::Uuid>) {
        if self.arbiter.current() != Action::Connect {
            debug!("Services of {} resolved outside a connect action", device.address);
            return;
        }
        let Some(pending) = self.connection.as_mut() else {
            return;
        };
        if pending.device.address != device.address {
            debug!("Services resolved for {} while connecting {}", device.address, pending.device.address);
            return;
        }
        if pending.task.is_some() {
            debug!("Services of {} resolved again, attempt already running", device.address);
            return;
        }

        let attempt = ConnectionAttempt::new(pending.device.clone(), services, self.limits);
        pending.task = Some(tokio::spawn(attempt.run(self.radio.clone())));
    }

    fn complete_connection(&mut self, result: Result<AttemptReport, JoinError>) {
        let succeeded = match result {
            Ok(report) => report.succeeded(),
            Err(e) => {
                error!("Connection attempt ended abnormally: {}", e);
                false
            }
        };
        self.finish_connection(succeeded);
    }

    fn finish_connection(&mut self, succeeded: bool) {
        let Some(pending) = self.connection.take() else {
            return;
        };
        self.arbiter.complete_if(Action::Connect);

        if succeeded {
            info!("Connected to {}", pending.device.address);
        } else {
            info!("Could not connect to {}", pending.device.address);
        }
        if let Some(observer) = &self.observers.connection {
            if succeeded {
                observer.on_connection_succeeded();
            } else {
                observer.on_connection_failed();
            }
        }
    }

    /// Wait for a running connection attempt and report its outcome.
    pub async fn settle(&mut self) {
        let Some(task) = self.connection.as_mut().and_then(|pending| pending.task.as_mut()) else {
            return;
        };
        let result = task.await;
        self.complete_connection(result);
    }

    /// Consume radio notifications and requests until the notification
    /// channel closes. A connection attempt still running at that point is
    /// awaited before returning.
    pub async fn run(mut self, mut events: mpsc::Receiver<RadioEvent>, mut requests: mpsc::Receiver<Request>) {
        info!("Orchestrator running");
        let mut requests_open = true;

        loop {
            let deadline = if self.force_finish_on_timeout {
                self.discovery.deadline()
            } else {
                None
            };

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                request = requests.recv(), if requests_open => match request {
                    Some(request) => self.handle_request(request).await,
                    None => requests_open = false,
                },
                result = attempt_finished(&mut self.connection) => self.complete_connection(result),
                _ = deadline_reached(deadline) => self.expire_discovery().await,
            }
        }

        self.settle().await;
        info!("Orchestrator stopped");
    }

    // ---- Observer dispatch ----

    fn notify_scan(&self, event: ScanEvent) {
        let Some(observer) = &self.observers.scan else {
            return;
        };
        match event {
            ScanEvent::Started => observer.on_scan_started(),
            ScanEvent::DeviceFound(devices) => observer.on_device_found(&devices),
            ScanEvent::FinishedWithDevices => observer.on_scan_finished_with_devices(),
            ScanEvent::FinishedEmpty => observer.on_scan_finished_without_devices(),
        }
    }

    fn notify_pairing(&self, event: PairingEvent) {
        let Some(observer) = &self.observers.pairing else {
            return;
        };
        match event {
            PairingEvent::Started => observer.on_pairing_started(),
            PairingEvent::WaitingForAuthorization => observer.on_waiting_for_authorization(),
            PairingEvent::Paired => observer.on_paired(),
            PairingEvent::Unpaired { last_action } => observer.on_unpaired(last_action),
        }
    }

    fn notify_followed(&self, event: FollowedEvent) {
        let Some(observer) = &self.observers.followed else {
            return;
        };
        match event {
            FollowedEvent::Connected { name } => observer.on_device_connected(&name),
            FollowedEvent::Disconnected { name } => observer.on_device_disconnected(&name),
        }
    }

    fn notify_power(&self, event: PowerEvent) {
        let Some(observer) = &self.observers.power else {
            return;
        };
        match event {
            PowerEvent::Enabled => observer.on_enabled(),
            PowerEvent::Disabled => observer.on_disabled(),
        }
    }
}

async fn attempt_finished(connection: &mut Option<PendingConnection>) -> Result<AttemptReport, JoinError> {
    match connection.as_mut().and_then(|pending| pending.task.as_mut()) {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
