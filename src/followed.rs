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

//! Connect/disconnect notifications for the followed device.

use std::sync::Arc;
use tracing::{debug, info};

use crate::action::Action;
use crate::bluetooth::Device;
use crate::storage::FollowedDeviceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowedEvent {
    Connected { name: String },
    Disconnected { name: String },
}

pub struct FollowedDeviceMonitor {
    store: Arc<dyn FollowedDeviceStore>,
}

impl FollowedDeviceMonitor {
    pub fn new(store: Arc<dyn FollowedDeviceStore>) -> Self {
        Self { store }
    }

    /// Report a link change of the followed device, unless an action is in
    /// flight (its link churn is not an organic connect or disconnect).
    pub fn on_link_change(&self, change: LinkChange, device: &Device, action: Action) -> Option<FollowedEvent> {
        let followed = self.store.followed_address()?;
        if followed != device.address {
            return None;
        }

        if action != Action::None {
            debug!(
                "Followed device {:?} during {} action, not reporting",
                change,
                action.as_str()
            );
            return None;
        }

        let name = device.display_name().to_string();
        info!("Followed device {} {:?}", name, change);
        Some(match change {
            LinkChange::Connected => FollowedEvent::Connected { name },
            LinkChange::Disconnected => FollowedEvent::Disconnected { name },
        })
    }
}
