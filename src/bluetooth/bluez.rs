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

//! BlueZ radio backend.

use anyhow::Result;
use async_trait::async_trait;
use bluer::agent::{Agent, AgentHandle, ReqError, RequestPasskey, RequestPinCode};
use bluer::{Adapter, AdapterEvent, AdapterProperty, Address, DeviceEvent, DeviceProperty, Session};
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::device::{BondState, Device, PowerState};
use super::radio::{Radio, RadioEvent};
use crate::config::Config;
use crate::error::RadioError;

/// Capacity of the notification channel.
const EVENT_CHANNEL_SIZE: usize = 64;

impl From<bluer::Error> for RadioError {
    fn from(e: bluer::Error) -> Self {
        match e.kind {
            bluer::ErrorKind::NotSupported => RadioError::Unsupported("not supported by adapter"),
            bluer::ErrorKind::DoesNotExist => RadioError::NotFound(e.message),
            _ => RadioError::Backend(e.to_string()),
        }
    }
}

/// PIN codes offered to peers, per address with a fallback.
#[derive(Debug)]
struct Secrets {
    fallback: String,
    by_address: HashMap<Address, String>,
}

impl Secrets {
    fn get(&self, address: Address) -> String {
        self.by_address
            .get(&address)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Radio backed by the BlueZ daemon over D-Bus.
pub struct BluezRadio {
    adapter: Adapter,
    events: mpsc::Sender<RadioEvent>,
    secrets: Arc<RwLock<Secrets>>,
    discovery: Mutex<Option<JoinHandle<()>>>,
    monitor: JoinHandle<()>,
    _agent: AgentHandle,
    _session: Session,
}

impl BluezRadio {
    /// Open the configured adapter and start reporting its notifications.
    pub async fn new(config: &Config) -> Result<(Self, mpsc::Receiver<RadioEvent>)> {
        info!("Initializing BlueZ radio...");

        let session = bluer::Session::new().await?;
        info!("BlueZ session created");

        let adapter = match &config.bluetooth.adapter {
            Some(name) => session.adapter(name)?,
            None => session.default_adapter().await?,
        };
        info!("Using Bluetooth adapter: {}", adapter.name());

        let secrets = Arc::new(RwLock::new(Secrets {
            fallback: config.pairing.secret.clone(),
            by_address: HashMap::new(),
        }));
        let agent = session.register_agent(pairing_agent(secrets.clone())).await?;
        info!("Pairing agent registered");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let watched = Arc::new(Mutex::new(HashSet::new()));
        for address in adapter.device_addresses().await? {
            watch_device(&adapter, address, event_tx.clone(), watched.clone());
        }
        let monitor = start_adapter_monitor(adapter.clone(), event_tx.clone(), watched);

        Ok((
            Self {
                adapter,
                events: event_tx,
                secrets,
                discovery: Mutex::new(None),
                monitor,
                _agent: agent,
                _session: session,
            },
            event_rx,
        ))
    }

    fn address(address: &str) -> Result<Address, RadioError> {
        address
            .parse()
            .map_err(|_| RadioError::NotFound(address.to_string()))
    }

    async fn known_device(&self, address: &str) -> Result<bluer::Device, RadioError> {
        let addr = Self::address(address)?;
        if !self.adapter.device_addresses().await?.contains(&addr) {
            return Err(RadioError::NotFound(address.to_string()));
        }
        Ok(self.adapter.device(addr)?)
    }

}

/// Queue a notification from a [`Radio`] method without waiting for channel
/// capacity. Those methods run on the consumer that drains the channel.
fn post(events: &mpsc::Sender<RadioEvent>, event: RadioEvent) -> JoinHandle<()> {
    let events = events.clone();
    tokio::spawn(async move {
        if events.send(event).await.is_err() {
            debug!("Notification channel closed");
        }
    })
}

/// Abort the discovery task held in `slot`. Returns whether it was running.
fn abort_discovery(slot: &Mutex<Option<JoinHandle<()>>>) -> bool {
    let Some(task) = slot.lock().take() else {
        return false;
    };
    let was_running = !task.is_finished();
    task.abort();
    was_running
}

impl Drop for BluezRadio {
    fn drop(&mut self) {
        self.monitor.abort();
        abort_discovery(&self.discovery);
    }
}

#[async_trait]
impl Radio for BluezRadio {
    async fn power_state(&self) -> Result<PowerState, RadioError> {
        if self.adapter.is_powered().await? {
            Ok(PowerState::On)
        } else {
            Ok(PowerState::Off)
        }
    }

    async fn disable(&self) -> Result<(), RadioError> {
        info!("Powering off Bluetooth adapter...");
        self.adapter.set_powered(false).await?;
        Ok(())
    }

    async fn start_discovery(&self) -> Result<(), RadioError> {
        let mut slot = self.discovery.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }

        let adapter = self.adapter.clone();
        let events = self.events.clone();
        *slot = Some(tokio::spawn(async move {
            run_discovery(adapter, events).await;
        }));
        Ok(())
    }

    async fn cancel_discovery(&self) -> Result<(), RadioError> {
        // The caller finishes its own session; no notification is sent.
        if abort_discovery(&self.discovery) {
            info!("Discovery cancelled");
        }
        Ok(())
    }

    async fn is_discovering(&self) -> Result<bool, RadioError> {
        Ok(self
            .discovery
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished()))
    }

    async fn bonded_devices(&self) -> Result<Vec<Device>, RadioError> {
        let mut devices = Vec::new();
        for addr in self.adapter.device_addresses().await? {
            let device = self.adapter.device(addr)?;
            if device.is_paired().await? {
                devices.push(snapshot(&device).await);
            }
        }
        Ok(devices)
    }

    async fn device(&self, address: &str) -> Result<Option<Device>, RadioError> {
        match self.known_device(address).await {
            Ok(device) => Ok(Some(snapshot(&device).await)),
            Err(RadioError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_pairing_secret(&self, address: &str, secret: &str) -> Result<(), RadioError> {
        let addr = Self::address(address)?;
        self.secrets
            .write()
            .by_address
            .insert(addr, secret.to_string());
        Ok(())
    }

    async fn create_bond(&self, address: &str) -> Result<(), RadioError> {
        let device = self.known_device(address).await?;
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut current = snapshot(&device).await;
            current.bond_state = BondState::Bonding;
            if events
                .send(RadioEvent::BondStateChanged { device: Some(current) })
                .await
                .is_err()
            {
                return;
            }

            let bond_state = match device.pair().await {
                Ok(()) => BondState::Bonded,
                Err(e) => {
                    warn!("Pairing with {} failed: {}", device.address(), e);
                    BondState::None
                }
            };
            let mut current = snapshot(&device).await;
            current.bond_state = bond_state;
            let _ = events
                .send(RadioEvent::BondStateChanged { device: Some(current) })
                .await;
        });
        Ok(())
    }

    async fn remove_bond(&self, address: &str) -> Result<(), RadioError> {
        let device = self.known_device(address).await?;
        let mut current = snapshot(&device).await;
        self.adapter.remove_device(device.address()).await?;

        current.bond_state = BondState::None;
        post(&self.events, RadioEvent::BondStateChanged { device: Some(current) });
        Ok(())
    }

    async fn fetch_services(&self, address: &str) -> Result<(), RadioError> {
        let device = self.known_device(address).await?;
        let events = self.events.clone();

        tokio::spawn(async move {
            let services = match device.uuids().await {
                Ok(uuids) => uuids.map(|uuids| {
                    let mut services: Vec<Uuid> = uuids.into_iter().collect();
                    // BlueZ reports an unordered set; sorted only for a stable order.
                    services.sort();
                    services
                }),
                Err(e) => {
                    warn!("Failed to read services of {}: {}", device.address(), e);
                    None
                }
            };
            let current = snapshot(&device).await;
            let _ = events
                .send(RadioEvent::ServicesResolved {
                    device: Some(current),
                    services,
                })
                .await;
        });
        Ok(())
    }

    async fn connect_service(&self, address: &str, service: Uuid) -> Result<(), RadioError> {
        let device = self.known_device(address).await?;
        device.connect_profile(&service).await?;
        Ok(())
    }
}

/// Agent answering PIN and passkey requests from the configured secrets.
fn pairing_agent(secrets: Arc<RwLock<Secrets>>) -> Agent {
    let pin_secrets = secrets.clone();
    Agent {
        request_default: true,
        request_pin_code: Some(Box::new(move |req: RequestPinCode| {
            let secrets = pin_secrets.clone();
            Box::pin(async move {
                debug!("PIN code requested by {}", req.device);
                Ok::<_, ReqError>(secrets.read().get(req.device))
            })
        })),
        request_passkey: Some(Box::new(move |req: RequestPasskey| {
            let secrets = secrets.clone();
            Box::pin(async move {
                debug!("Passkey requested by {}", req.device);
                secrets
                    .read()
                    .get(req.device)
                    .parse::<u32>()
                    .map_err(|_| ReqError::Rejected)
            })
        })),
        ..Default::default()
    }
}

/// Current state of a BlueZ device.
async fn snapshot(device: &bluer::Device) -> Device {
    let bond_state = match device.is_paired().await {
        Ok(true) => BondState::Bonded,
        _ => BondState::None,
    };
    Device {
        address: device.address().to_string(),
        name: device.name().await.ok().flatten(),
        bond_state,
    }
}

async fn run_discovery(adapter: Adapter, events: mpsc::Sender<RadioEvent>) {
    let stream = match adapter.discover_devices().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to start discovery: {}", e);
            return;
        }
    };
    let mut stream = Box::pin(stream);

    info!("Discovery started");
    if events.send(RadioEvent::DiscoveryStarted).await.is_err() {
        return;
    }

    while let Some(event) = stream.next().await {
        if let AdapterEvent::DeviceAdded(address) = event {
            let device = match adapter.device(address) {
                Ok(device) => Some(snapshot(&device).await),
                Err(e) => {
                    debug!("Found device {} is unavailable: {}", address, e);
                    None
                }
            };
            if events.send(RadioEvent::DeviceFound { device }).await.is_err() {
                return;
            }
        }
    }

    info!("Discovery finished");
    let _ = events.send(RadioEvent::DiscoveryFinished).await;
}

/// Report adapter power changes and watch devices as they appear.
fn start_adapter_monitor(
    adapter: Adapter,
    events: mpsc::Sender<RadioEvent>,
    watched: Arc<Mutex<HashSet<Address>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut adapter_events = match adapter.events().await {
            Ok(stream) => Box::pin(stream),
            Err(e) => {
                warn!("Failed to get adapter events: {}", e);
                return;
            }
        };

        while let Some(event) = adapter_events.next().await {
            match event {
                AdapterEvent::DeviceAdded(address) => {
                    watch_device(&adapter, address, events.clone(), watched.clone());
                }
                AdapterEvent::PropertyChanged(AdapterProperty::Powered(powered)) => {
                    debug!("Adapter powered: {}", powered);
                    if events.send(RadioEvent::PowerChanged).await.is_err() {
                        return;
                    }
                }
                _ => {}
            }
        }

        warn!("Adapter event stream ended");
    })
}

/// Report link changes of one device until it disappears.
fn watch_device(
    adapter: &Adapter,
    address: Address,
    events: mpsc::Sender<RadioEvent>,
    watched: Arc<Mutex<HashSet<Address>>>,
) {
    if !watched.lock().insert(address) {
        return;
    }
    let device = match adapter.device(address) {
        Ok(device) => device,
        Err(e) => {
            debug!("Cannot watch {}: {}", address, e);
            watched.lock().remove(&address);
            return;
        }
    };

    tokio::spawn(async move {
        if let Ok(stream) = device.events().await {
            let mut stream = Box::pin(stream);
            while let Some(DeviceEvent::PropertyChanged(property)) = stream.next().await {
                let DeviceProperty::Connected(connected) = property else {
                    continue;
                };
                let current = Some(snapshot(&device).await);
                let event = if connected {
                    RadioEvent::LinkConnected { device: current }
                } else {
                    RadioEvent::LinkDisconnected { device: current }
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
        }
        watched.lock().remove(&address);
    });
}
