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

//! Single-slot arbitration of the action currently in flight.

use tracing::debug;

use crate::error::LifecycleError;

/// High-level action that owns the radio until its terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    Pair,
    Unpair,
    Connect,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Pair => "pair",
            Action::Unpair => "unpair",
            Action::Connect => "connect",
        }
    }

    /// Pairing-related actions, during which bond and link events belong to
    /// the pairing workflow.
    pub fn is_bonding(&self) -> bool {
        matches!(self, Action::Pair | Action::Unpair)
    }
}

/// Holds the one active action.
///
/// Transitions always go `None -> X -> None`; starting a new action while one
/// is active is rejected.
#[derive(Debug, Default)]
pub struct ActionArbiter {
    current: Action,
}

impl ActionArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Action {
        self.current
    }

    pub fn is_idle(&self) -> bool {
        self.current == Action::None
    }

    pub fn begin_pair(&mut self) -> Result<(), LifecycleError> {
        self.begin(Action::Pair)
    }

    pub fn begin_unpair(&mut self) -> Result<(), LifecycleError> {
        self.begin(Action::Unpair)
    }

    pub fn begin_connect(&mut self) -> Result<(), LifecycleError> {
        self.begin(Action::Connect)
    }

    fn begin(&mut self, action: Action) -> Result<(), LifecycleError> {
        if self.current != Action::None {
            return Err(LifecycleError::AlreadyInProgress {
                active: self.current,
            });
        }
        debug!("Action begins: {}", action.as_str());
        self.current = action;
        Ok(())
    }

    /// Clear the slot after a terminal outcome, returning the action that
    /// was active. Completing while idle is a no-op that returns `None`.
    pub fn complete(&mut self) -> Action {
        let finished = std::mem::take(&mut self.current);
        if finished != Action::None {
            debug!("Action complete: {}", finished.as_str());
        }
        finished
    }

    /// Clear the slot only if `action` is the active one.
    pub fn complete_if(&mut self, action: Action) -> bool {
        if self.current == action && action != Action::None {
            self.complete();
            true
        } else {
            false
        }
    }
}
