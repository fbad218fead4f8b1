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

//! Persisted address of the followed device.

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::bluetooth::Device;

/// Read access to the followed device address.
pub trait FollowedDeviceStore: Send + Sync {
    fn followed_address(&self) -> Option<String>;
}

/// Followed device record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowedDevice {
    pub address: String,
    pub name: Option<String>,
    pub followed_at: chrono::DateTime<chrono::Local>,
}

/// Followed device stored as JSON in the data directory.
///
/// Reads go back to the file, so a device followed by another process is
/// picked up by a running monitor.
pub struct JsonFollowedStore {
    path: PathBuf,
    device: RwLock<Option<FollowedDevice>>,
}

impl JsonFollowedStore {
    /// Create or open the store.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("followed_device.json");
        let device = Self::load(&path)?;

        Ok(Self {
            path,
            device: RwLock::new(device),
        })
    }

    fn load(path: &Path) -> Result<Option<FollowedDevice>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Re-read the file. The last good record is kept if it cannot be read.
    fn refresh(&self) -> Option<FollowedDevice> {
        match Self::load(&self.path) {
            Ok(device) => {
                *self.device.write() = device.clone();
                device
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                self.device.read().clone()
            }
        }
    }

    /// Follow a device, replacing any previous one.
    pub fn follow(&self, device: &Device) -> Result<()> {
        let record = FollowedDevice {
            address: device.address.clone(),
            name: device.name.clone(),
            followed_at: chrono::Local::now(),
        };
        *self.device.write() = Some(record);
        self.save()?;
        info!("Following device {}", device.address);
        Ok(())
    }

    /// Stop following.
    pub fn unfollow(&self) -> Result<()> {
        *self.device.write() = None;
        self.save()?;
        info!("No longer following a device");
        Ok(())
    }

    pub fn followed(&self) -> Option<FollowedDevice> {
        self.refresh()
    }

    /// Save to disk.
    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&*self.device.read())?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl FollowedDeviceStore for JsonFollowedStore {
    fn followed_address(&self) -> Option<String> {
        self.refresh().map(|device| device.address)
    }
}

/// In-memory store for embedding without persistence.
#[derive(Debug, Default)]
pub struct MemoryFollowedStore {
    address: RwLock<Option<String>>,
}

impl MemoryFollowedStore {
    pub fn with_address(address: &str) -> Self {
        Self {
            address: RwLock::new(Some(address.to_string())),
        }
    }

    pub fn set(&self, address: Option<&str>) {
        *self.address.write() = address.map(str::to_string);
    }
}

impl FollowedDeviceStore for MemoryFollowedStore {
    fn followed_address(&self) -> Option<String> {
        self.address.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_follow_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let store = JsonFollowedStore::new(dir.path()).unwrap();
        assert_eq!(store.followed_address(), None);

        store
            .follow(&Device::new("12:34:56:78:9A:BC", Some("Watch")))
            .unwrap();

        let reopened = JsonFollowedStore::new(dir.path()).unwrap();
        assert_eq!(reopened.followed_address(), Some("12:34:56:78:9A:BC".to_string()));
        assert_eq!(reopened.followed().unwrap().name, Some("Watch".to_string()));
    }

    #[test]
    fn test_unfollow_clears() {
        let dir = tempdir().unwrap();
        let store = JsonFollowedStore::new(dir.path()).unwrap();
        store.follow(&Device::new("12:34:56:78:9A:BC", None)).unwrap();
        store.unfollow().unwrap();

        let reopened = JsonFollowedStore::new(dir.path()).unwrap();
        assert_eq!(reopened.followed_address(), None);
    }

    #[test]
    fn test_follow_seen_by_other_handle() {
        let dir = tempdir().unwrap();
        let monitor = JsonFollowedStore::new(dir.path()).unwrap();
        let cli = JsonFollowedStore::new(dir.path()).unwrap();
        assert_eq!(monitor.followed_address(), None);

        cli.follow(&Device::new("12:34:56:78:9A:BC", Some("Watch"))).unwrap();
        assert_eq!(monitor.followed_address(), Some("12:34:56:78:9A:BC".to_string()));

        cli.unfollow().unwrap();
        assert_eq!(monitor.followed_address(), None);
    }

    #[test]
    fn test_unreadable_file_keeps_last_record() {
        let dir = tempdir().unwrap();
        let store = JsonFollowedStore::new(dir.path()).unwrap();
        store.follow(&Device::new("12:34:56:78:9A:BC", None)).unwrap();

        std::fs::write(dir.path().join("followed_device.json"), "not json").unwrap();
        assert_eq!(store.followed_address(), Some("12:34:56:78:9A:BC".to_string()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryFollowedStore::default();
        assert_eq!(store.followed_address(), None);
        store.set(Some("AA:AA:AA:AA:AA:AA"));
        assert_eq!(store.followed_address(), Some("AA:AA:AA:AA:AA:AA".to_string()));
    }
}
