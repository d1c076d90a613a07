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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use oracle_chain_client::ChainClient;
use oracle_relayer_context::{RelayerContext, Shutdown};
use oracle_relayer_store::{HistoryStore, HistoryStoreKey, OutcomeCacheStore};
use oracle_relayer_utils::Result;
use tokio::time::MissedTickBehavior;

use crate::{RelayEvent, RelayObserver, RequestProcessor};

/// What a single [`RequestPoller::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still running, nothing was done.
    Busy,
    /// The chain height did not move past the watermark.
    NoNewBlocks {
        /// The height read.
        height: u64,
    },
    /// `from..=to` got scanned and the watermark moved to `to`.
    Scanned {
        /// First block of the range.
        from: u64,
        /// Last block of the range.
        to: u64,
        /// Requests fulfilled.
        fulfilled: usize,
        /// Requests skipped.
        skipped: usize,
    },
}

/// Polls the oracle contract for new requests, one block range per tick.
///
/// The watermark is the last fully scanned block. It only moves forward, and
/// only once every request of the range went through the pipeline, whatever
/// the outcome of each request was. A failure to read the chain leaves it
/// untouched so the same range is scanned again on the next tick.
pub struct RequestPoller<S> {
    chain: Arc<dyn ChainClient>,
    processor: RequestProcessor<S>,
    store: S,
    key: HistoryStoreKey,
    observer: Arc<dyn RelayObserver>,
    busy: AtomicBool,
}

/// Clears the busy flag when the tick settles, even on early returns.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S> RequestPoller<S>
where
    S: HistoryStore + OutcomeCacheStore,
{
    /// Creates a new poller, keeping its watermark in `store` under `key`.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        processor: RequestProcessor<S>,
        store: S,
        key: HistoryStoreKey,
        observer: Arc<dyn RelayObserver>,
    ) -> Self {
        Self {
            chain,
            processor,
            store,
            key,
            observer,
            busy: AtomicBool::new(false),
        }
    }

    /// Sets the initial watermark.
    ///
    /// With a `start_block` the first tick scans from that block, otherwise
    /// scanning starts after the current chain height.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self, start_block: Option<u64>) -> Result<u64> {
        let watermark = match start_block {
            Some(block) => block.saturating_sub(1),
            None => self.chain.block_number().await?,
        };
        self.store.set_last_block_number(self.key, watermark)?;
        tracing::event!(
            target: oracle_relayer_utils::probe::TARGET,
            tracing::Level::DEBUG,
            kind = %oracle_relayer_utils::probe::Kind::Sync,
            chain_id = %self.key.chain_id(),
            %watermark,
            initialized = true,
        );
        Ok(watermark)
    }

    /// The last fully scanned block.
    pub fn watermark(&self) -> Result<u64> {
        self.store.get_last_block_number_or_default(self.key)
    }

    /// The request processor used by this poller.
    pub fn processor(&self) -> &RequestProcessor<S> {
        &self.processor
    }

    /// Scans the blocks after the watermark up to the current height.
    ///
    /// Returns [`TickOutcome::Busy`] right away if another tick is running.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("Previous tick still running, skipping");
            return Ok(TickOutcome::Busy);
        };
        let watermark = self.watermark()?;
        self.observer
            .on_event(&RelayEvent::TickStarted { watermark });

        let height = match self.chain.block_number().await {
            Ok(height) => height,
            Err(e) => {
                self.observer.on_event(&RelayEvent::TickFailed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        if height <= watermark {
            self.observer.on_event(&RelayEvent::NoNewBlocks { height });
            return Ok(TickOutcome::NoNewBlocks { height });
        }

        let from = watermark + 1;
        let requests = match self.chain.requests_in_range(from, height).await {
            Ok(requests) => requests,
            Err(e) => {
                self.observer.on_event(&RelayEvent::TickFailed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        tracing::trace!("Found #{} requests", requests.len());

        let mut fulfilled = 0;
        let mut skipped = 0;
        // one at a time, so fulfillment nonces follow the log order.
        for request in &requests {
            match self.processor.process(request).await {
                Ok(_) => fulfilled += 1,
                Err(_) => skipped += 1,
            }
        }

        self.store.set_last_block_number(self.key, height)?;
        tracing::event!(
            target: oracle_relayer_utils::probe::TARGET,
            tracing::Level::TRACE,
            kind = %oracle_relayer_utils::probe::Kind::Sync,
            chain_id = %self.key.chain_id(),
            %from,
            to = %height,
        );
        self.observer.on_event(&RelayEvent::TickCompleted {
            from,
            to: height,
            fulfilled,
            skipped,
        });
        Ok(TickOutcome::Scanned {
            from,
            to: height,
            fulfilled,
            skipped,
        })
    }

    /// Ticks every `polling_interval` until `shutdown` fires.
    ///
    /// A tick always settles before the next one starts, intervals missed
    /// meanwhile are dropped.
    #[tracing::instrument(
        skip_all,
        fields(
            chain_id = %self.key.chain_id(),
            address = %self.key.address(),
        ),
    )]
    pub async fn run(
        &self,
        polling_interval: Duration,
        mut shutdown: Shutdown,
    ) -> Result<()> {
        let mut interval = tokio::time::interval(polling_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(
                            "Tick failed, the range will be retried: {}",
                            e
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Request poller is shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}

impl RequestPoller<oracle_relayer_store::InMemoryStore> {
    /// Builds a poller from the relayer context, reporting to `observer`.
    pub fn from_context(
        ctx: &RelayerContext,
        observer: Arc<dyn RelayObserver>,
    ) -> Self {
        let processor = RequestProcessor::from_context(ctx, observer.clone());
        Self::new(
            ctx.chain_client(),
            processor,
            ctx.store().clone(),
            ctx.history_store_key(),
            observer,
        )
    }
}
