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

//! Adapter power tracking.

use tracing::{debug, info};

use crate::bluetooth::PowerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    Enabled,
    Disabled,
}

#[derive(Debug, Default)]
pub struct AdapterPowerMonitor {
    current: Option<PowerState>,
}

impl AdapterPowerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last observed state, if any notification has been seen.
    pub fn current(&self) -> Option<PowerState> {
        self.current
    }

    /// Record a power notification. Transitional states are tracked but
    /// never reported.
    pub fn on_power_state(&mut self, state: PowerState) -> Option<PowerEvent> {
        self.current = Some(state);
        match state {
            PowerState::On => {
                info!("Adapter powered on");
                Some(PowerEvent::Enabled)
            }
            PowerState::Off => {
                info!("Adapter powered off");
                Some(PowerEvent::Disabled)
            }
            PowerState::TurningOn | PowerState::TurningOff => {
                debug!("Adapter {}", state.as_str());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turning_on_then_on() {
        let mut monitor = AdapterPowerMonitor::new();
        let events: Vec<_> = [PowerState::TurningOn, PowerState::On]
            .into_iter()
            .filter_map(|state| monitor.on_power_state(state))
            .collect();

        assert_eq!(events, vec![PowerEvent::Enabled]);
        assert_eq!(monitor.current(), Some(PowerState::On));
    }

    #[test]
    fn test_turning_off_then_off() {
        let mut monitor = AdapterPowerMonitor::new();
        assert_eq!(monitor.on_power_state(PowerState::TurningOff), None);
        assert_eq!(monitor.current(), Some(PowerState::TurningOff));
        assert_eq!(monitor.on_power_state(PowerState::Off), Some(PowerEvent::Disabled));
    }
}
