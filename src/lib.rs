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

//! Bluetooth peer lifecycle orchestration.
//!
//! Drives discovery, pairing and service connection against a platform
//! [`Radio`](bluetooth::Radio), serializing user requests with radio
//! notifications and reporting progress to registered observers.

pub mod action;
pub mod bluetooth;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod events;
pub mod followed;
pub mod observer;
pub mod pairing;
pub mod power;
pub mod state;
pub mod storage;

pub use action::{Action, ActionArbiter};
pub use config::Config;
pub use error::{LifecycleError, RadioError};
pub use events::{Orchestrator, Request};
pub use observer::Observers;
