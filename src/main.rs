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

//! peerlink command line

use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peerlink::bluetooth::{BluezRadio, Device, Radio};
use peerlink::state::{AppState, StatusObserver};
use peerlink::storage::JsonFollowedStore;
use peerlink::{Config, Observers, Orchestrator, Request};

const USAGE: &str = "usage: peerlink [monitor | pair ADDR | unpair ADDR | connect ADDR | follow ADDR | unfollow]";

/// Command selected on the command line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Monitor,
    Pair(String),
    Unpair(String),
    Connect(String),
    Follow(String),
    Unfollow,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            [] | ["monitor"] => Command::Monitor,
            ["pair", address] => Command::Pair(address.to_string()),
            ["unpair", address] => Command::Unpair(address.to_string()),
            ["connect", address] => Command::Connect(address.to_string()),
            ["follow", address] => Command::Follow(address.to_string()),
            ["unfollow"] => Command::Unfollow,
            _ => bail!(USAGE),
        };
        Ok(command)
    }

    fn request(&self) -> Option<Request> {
        match self {
            Command::Monitor => Some(Request::StartScan),
            Command::Pair(address) => Some(Request::Pair(address.clone())),
            Command::Unpair(address) => Some(Request::Unpair(address.clone())),
            Command::Connect(address) => Some(Request::Connect(address.clone())),
            Command::Follow(_) | Command::Unfollow => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("peerlink=info".parse()?))
        .init();

    info!("Starting peerlink v{}...", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    let store = Arc::new(JsonFollowedStore::new(&config.data_dir)?);
    if command == Command::Unfollow {
        store.unfollow()?;
        return Ok(());
    }

    let (radio, radio_events) = BluezRadio::new(&config).await?;
    let radio: Arc<dyn Radio> = Arc::new(radio);

    if let Command::Follow(address) = &command {
        let device = radio
            .device(address)
            .await?
            .unwrap_or_else(|| Device::new(address, None));
        store.follow(&device)?;
        return Ok(());
    }

    let state = AppState::new();
    let observers = Observers::all(StatusObserver::new(state.clone()));
    let orchestrator = Orchestrator::new(radio, store, &config, observers);

    let (request_tx, request_rx) = mpsc::channel(16);
    if let Some(request) = command.request() {
        request_tx.send(request).await?;
    }

    info!("Ready.");

    tokio::select! {
        _ = orchestrator.run(radio_events, request_rx) => {
            info!("Radio notifications ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    if let Some(name) = state.get_followed_connected() {
        info!("Followed device {} still connected", name);
    }
    info!("peerlink stopped");
    Ok(())
}
