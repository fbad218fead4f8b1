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

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::connection::AttemptLimits;
use crate::discovery::DedupKey;
use crate::pairing::DEFAULT_PAIRING_SECRET;

const APP_DIR: &str = "peerlink";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for the followed device record.
    #[serde(skip)]
    pub data_dir: PathBuf,

    /// Adapter settings.
    pub bluetooth: BluetoothConfig,

    /// Discovery settings.
    pub discovery: DiscoveryConfig,

    /// Pairing settings.
    pub pairing: PairingConfig,

    /// Connection settings.
    pub connection: ConnectionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Adapter name such as "hci0". The default adapter is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// A scan is finished once this much time has passed since it started.
    pub timeout_ms: u64,

    /// Field deciding whether two found devices are the same peer.
    pub dedup_key: DedupKey,

    /// Finish a timed-out scan from a timer instead of waiting for the next
    /// found device.
    pub force_finish_on_timeout: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            dedup_key: DedupKey::Address,
            force_finish_on_timeout: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// PIN offered to peers that ask for one.
    pub secret: String,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_PAIRING_SECRET.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Time allowed for connecting a single service.
    pub attempt_timeout_ms: u64,

    /// Services connected at the same time.
    pub max_concurrent_attempts: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        let limits = AttemptLimits::default();
        Self {
            attempt_timeout_ms: limits.attempt_timeout.as_millis() as u64,
            max_concurrent_attempts: limits.max_concurrent,
        }
    }
}

impl ConnectionConfig {
    pub fn limits(&self) -> AttemptLimits {
        AttemptLimits {
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            max_concurrent: self.max_concurrent_attempts.max(1),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file on first run.
    pub fn load() -> Result<Self> {
        let config_dir = config_dir();
        std::fs::create_dir_all(&config_dir)?;

        let mut config = Self::load_from(&config_dir.join("config.toml"))?;

        // Set data directory
        config.data_dir = data_dir();
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it does not
    /// exist. The data directory is left empty.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir().join("config.toml"))
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
