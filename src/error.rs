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

//! Error types.

use thiserror::Error;

use crate::action::Action;

/// A radio-stack operation could not be issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("Operation not supported by the radio stack: {0}")]
    Unsupported(&'static str),

    #[error("Device not known to the radio stack: {0}")]
    NotFound(String),

    #[error("Radio stack error: {0}")]
    Backend(String),
}

/// A lifecycle request was rejected before anything was sent to the radio.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Another action is already in progress: {active:?}")]
    AlreadyInProgress { active: Action },

    #[error("Device has not been identified: {0}")]
    UnknownDevice(String),

    #[error("Radio stack failure: {source}")]
    Radio {
        #[from]
        source: RadioError,
    },
}
