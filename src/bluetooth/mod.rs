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

//! Bluetooth radio access.
//!
//! [`Radio`] is the capability interface the orchestrator drives;
//! [`BluezRadio`] implements it on Linux.

mod bluez;
mod device;
mod radio;

pub use bluez::BluezRadio;
pub use device::{BondState, Device, DeviceKind, PowerState};
pub use radio::{Radio, RadioEvent};
