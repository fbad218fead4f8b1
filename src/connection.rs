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

//! Service connection attempts.
//!
//! Every candidate service is tried, even after one succeeds, so that all
//! usable services on the peer get connected. Attempts run with a bounded
//! number in flight and a timeout each, off the event-consumer task.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bluetooth::{Device, Radio};
use crate::error::RadioError;

/// Default time a single service connection may take.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptLimits {
    pub attempt_timeout: Duration,
    /// Candidates connected at the same time. Zero is treated as one.
    pub max_concurrent: usize,
}

impl Default for AttemptLimits {
    fn default() -> Self {
        Self {
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_concurrent: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateResult {
    Connected,
    Failed(RadioError),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOutcome {
    pub service: Uuid,
    pub result: CandidateResult,
}

/// Per-candidate results, in candidate order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub address: String,
    pub outcomes: Vec<CandidateOutcome>,
}

impl AttemptReport {
    /// Succeeded if any candidate connected.
    pub fn succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.result == CandidateResult::Connected)
    }

    pub fn connected_services(&self) -> Vec<Uuid> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result == CandidateResult::Connected)
            .map(|outcome| outcome.service)
            .collect()
    }
}

/// One connection attempt against a device and its advertised services.
#[derive(Debug, Clone)]
pub struct ConnectionAttempt {
    device: Device,
    candidates: Vec<Uuid>,
    limits: AttemptLimits,
}

impl ConnectionAttempt {
    /// Candidates are tried in the order given; no re-ranking happens.
    pub fn new(device: Device, candidates: Vec<Uuid>, limits: AttemptLimits) -> Self {
        Self {
            device,
            candidates,
            limits,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn candidates(&self) -> &[Uuid] {
        &self.candidates
    }

    pub async fn run(self, radio: Arc<dyn Radio>) -> AttemptReport {
        let address = self.device.address.clone();
        let attempt_timeout = self.limits.attempt_timeout;
        info!(
            "Trying {} services on {}",
            self.candidates.len(),
            address
        );

        let outcomes = stream::iter(self.candidates)
            .map(|service| {
                let radio = radio.clone();
                let address = address.clone();
                async move {
                    debug!("Connecting to service {} on {}", service, address);
                    let result = match timeout(attempt_timeout, radio.connect_service(&address, service)).await {
                        Ok(Ok(())) => {
                            info!("Connected to service {} on {}", service, address);
                            CandidateResult::Connected
                        }
                        Ok(Err(e)) => {
                            debug!("Service {} on {} failed: {}", service, address, e);
                            CandidateResult::Failed(e)
                        }
                        Err(_) => {
                            warn!("Service {} on {} timed out", service, address);
                            CandidateResult::TimedOut
                        }
                    };
                    CandidateOutcome { service, result }
                }
            })
            .buffered(self.limits.max_concurrent.max(1))
            .collect::<Vec<_>>()
            .await;

        AttemptReport { address, outcomes }
    }
}
