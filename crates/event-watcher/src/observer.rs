// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::sync::Arc;

use ethers::types::H256;
use oracle_relayer_utils::metric::Metrics;
use parking_lot::Mutex;

/// Where in the pipeline a request was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipStage {
    /// The entity directory rejected the request.
    Validation,
    /// The data could not be resolved.
    Resolution,
    /// The fulfillment could not be sent.
    Submission,
    /// The outcome could not be cached.
    Cache,
}

/// Everything worth knowing about the relay pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A tick started from `watermark`.
    TickStarted {
        /// The last scanned block.
        watermark: u64,
    },
    /// The chain did not move since the last tick.
    NoNewBlocks {
        /// The height read.
        height: u64,
    },
    /// `from..=to` got scanned, the watermark is now `to`.
    TickCompleted {
        /// First block of the range.
        from: u64,
        /// Last block of the range.
        to: u64,
        /// Requests fulfilled in the range.
        fulfilled: usize,
        /// Requests skipped in the range.
        skipped: usize,
    },
    /// Reading the height or the logs failed, the range is retried next tick.
    TickFailed {
        /// What went wrong.
        reason: String,
    },
    /// A request entered the pipeline.
    RequestObserved {
        /// The request id.
        request_id: H256,
        /// The requested entity.
        entity_id: String,
    },
    /// A request went all the way through and its outcome got cached.
    RequestProcessed {
        /// The request id.
        request_id: H256,
        /// The requested entity.
        entity_id: String,
        /// The value pushed on chain.
        value: u64,
    },
    /// A request was dropped.
    RequestSkipped {
        /// The request id.
        request_id: H256,
        /// The requested entity.
        entity_id: String,
        /// Where it was dropped.
        stage: SkipStage,
        /// Why.
        reason: String,
    },
    /// A fulfillment got mined.
    SubmissionSucceeded {
        /// The request id.
        request_id: H256,
        /// The fulfillment transaction.
        tx_hash: H256,
    },
    /// A fulfillment failed to estimate or send.
    SubmissionFailed {
        /// The request id.
        request_id: H256,
        /// What went wrong.
        reason: String,
    },
}

/// Receives the [`RelayEvent`]s of the pipeline.
pub trait RelayObserver: Send + Sync {
    /// Called synchronously for every event, in order.
    fn on_event(&self, event: &RelayEvent);
}

/// The default observer, logs every event and keeps the metrics up to date.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    metrics: Arc<Metrics>,
}

impl TracingObserver {
    /// Creates a new observer updating `metrics`.
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl RelayObserver for TracingObserver {
    fn on_event(&self, event: &RelayEvent) {
        match event {
            RelayEvent::TickStarted { watermark } => {
                tracing::trace!(watermark, "Polling for new requests");
            }
            RelayEvent::NoNewBlocks { height } => {
                tracing::trace!(height, "No new blocks");
            }
            RelayEvent::TickCompleted {
                from,
                to,
                fulfilled,
                skipped,
            } => {
                self.metrics.watermark_block.set(*to as f64);
                if fulfilled + skipped > 0 {
                    tracing::info!(
                        from,
                        to,
                        fulfilled,
                        skipped,
                        "Scanned blocks {}..={}",
                        from,
                        to
                    );
                } else {
                    tracing::debug!(from, to, "Scanned blocks {}..={}", from, to);
                }
            }
            RelayEvent::TickFailed { reason } => {
                self.metrics.poller_query_failures.inc();
                tracing::warn!("Failed to query the chain: {}", reason);
            }
            RelayEvent::RequestObserved {
                request_id,
                entity_id,
            } => {
                self.metrics.requests_observed.inc();
                tracing::info!(
                    ?request_id,
                    %entity_id,
                    "New request"
                );
            }
            RelayEvent::RequestProcessed {
                request_id,
                entity_id,
                value,
            } => {
                self.metrics.requests_fulfilled.inc();
                tracing::info!(
                    ?request_id,
                    %entity_id,
                    value,
                    "Request fulfilled"
                );
            }
            RelayEvent::RequestSkipped {
                request_id,
                entity_id,
                stage,
                reason,
            } => {
                self.metrics.requests_skipped.inc();
                tracing::warn!(
                    ?request_id,
                    %entity_id,
                    ?stage,
                    "Skipping request: {}",
                    reason
                );
            }
            RelayEvent::SubmissionSucceeded {
                request_id,
                tx_hash,
            } => {
                tracing::debug!(?request_id, ?tx_hash, "Fulfillment mined");
            }
            RelayEvent::SubmissionFailed { request_id, reason } => {
                self.metrics.submission_failures.inc();
                tracing::error!(
                    ?request_id,
                    "Fulfillment failed: {}",
                    reason
                );
            }
        }
    }
}

/// An observer that remembers every event, for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RelayEvent>>,
}

impl RecordingObserver {
    /// Every event received so far, in order.
    pub fn events(&self) -> Vec<RelayEvent> {
        self.events.lock().clone()
    }
}

impl RelayObserver for RecordingObserver {
    fn on_event(&self, event: &RelayEvent) {
        self.events.lock().push(event.clone());
    }
}
