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
use oracle_data_source_backends::FallbackResolver;
use oracle_relayer_context::RelayerContext;
use oracle_relayer_store::OutcomeCacheStore;
use oracle_relayer_types::{Fulfillment, Request, ResolutionOutcome};
use oracle_relayer_utils::{Error, Result};
use oracle_request_validator::EntityDirectory;
use oracle_tx_submitter::TxSubmitter;

use crate::{RelayEvent, RelayObserver, SkipStage};

/// Drives a single request through validation, resolution and submission,
/// then caches its outcome.
///
/// Failures are reported and returned, never retried.
#[derive(Clone)]
pub struct RequestProcessor<S> {
    directory: Arc<EntityDirectory>,
    resolver: Arc<FallbackResolver>,
    submitter: TxSubmitter,
    store: S,
    observer: Arc<dyn RelayObserver>,
}

impl<S> std::fmt::Debug for RequestProcessor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestProcessor")
            .field("entities", &self.directory.len())
            .field("sources", &self.resolver.len())
            .finish()
    }
}

impl<S: OutcomeCacheStore> RequestProcessor<S> {
    /// Creates a new processor.
    pub fn new(
        directory: Arc<EntityDirectory>,
        resolver: Arc<FallbackResolver>,
        submitter: TxSubmitter,
        store: S,
        observer: Arc<dyn RelayObserver>,
    ) -> Self {
        Self {
            directory,
            resolver,
            submitter,
            store,
            observer,
        }
    }

    /// Runs `request` through the pipeline, returns the cached outcome.
    pub async fn process(&self, request: &Request) -> Result<ResolutionOutcome> {
        self.observer.on_event(&RelayEvent::RequestObserved {
            request_id: request.request_id,
            entity_id: request.entity_id.clone(),
        });
        tracing::event!(
            target: oracle_relayer_utils::probe::TARGET,
            tracing::Level::DEBUG,
            kind = %oracle_relayer_utils::probe::Kind::Request,
            request_id = ?request.request_id,
            entity_id = %request.entity_id,
            source_block = request.source_block,
            observed = true,
        );
        let result = self.try_process(request).await;
        match &result {
            Ok(outcome) => {
                self.observer.on_event(&RelayEvent::RequestProcessed {
                    request_id: request.request_id,
                    entity_id: request.entity_id.clone(),
                    value: outcome.value,
                });
            }
            Err(e) => {
                tracing::event!(
                    target: oracle_relayer_utils::probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %oracle_relayer_utils::probe::Kind::Request,
                    request_id = ?request.request_id,
                    entity_id = %request.entity_id,
                    skipped = true,
                    stage = ?stage_of(e),
                );
                self.observer.on_event(&RelayEvent::RequestSkipped {
                    request_id: request.request_id,
                    entity_id: request.entity_id.clone(),
                    stage: stage_of(e),
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    async fn try_process(&self, request: &Request) -> Result<ResolutionOutcome> {
        let record = self.directory.validate(request)?;
        let resolution = self
            .resolver
            .resolve(&record.entity_id, &record.data_locator)
            .await?;
        let call = Fulfillment {
            request_id: request.request_id,
            entity_id: request.entity_id.clone(),
            value: resolution.value,
            data_locator: record.data_locator,
        };
        let tx_hash = match self.submitter.submit(&call).await {
            Ok(tx_hash) => {
                self.observer.on_event(&RelayEvent::SubmissionSucceeded {
                    request_id: call.request_id,
                    tx_hash,
                });
                tx_hash
            }
            Err(e) => {
                self.observer.on_event(&RelayEvent::SubmissionFailed {
                    request_id: call.request_id,
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };
        let outcome = ResolutionOutcome::confirmed(
            &call,
            tx_hash,
            chrono::Utc::now().timestamp_millis(),
        );
        self.store.put_outcome(&call.entity_id, outcome.clone())?;
        tracing::event!(
            target: oracle_relayer_utils::probe::TARGET,
            tracing::Level::DEBUG,
            kind = %oracle_relayer_utils::probe::Kind::ResultCache,
            entity_id = %outcome.entity_id,
            value = outcome.value,
            %tx_hash,
        );
        Ok(outcome)
    }

    /// Resolves and fulfills `entity_id` outside of the event log, under a
    /// fresh random request id.
    #[tracing::instrument(skip(self))]
    pub async fn trigger_manual_resolution(
        &self,
        entity_id: &str,
        display_name: &str,
    ) -> Result<ResolutionOutcome> {
        let request = Request {
            request_id: H256::from(rand::random::<[u8; 32]>()),
            requester: None,
            entity_id: entity_id.to_owned(),
            entity_name: display_name.to_owned(),
            source_block: 0,
            requested_at: u64::try_from(chrono::Utc::now().timestamp()).ok(),
        };
        tracing::info!(
            request_id = ?request.request_id,
            "Manual resolution for {}",
            entity_id
        );
        self.process(&request).await
    }

    /// The latest cached outcome of `entity_id`.
    pub fn get_latest_outcome(
        &self,
        entity_id: &str,
    ) -> Result<Option<ResolutionOutcome>> {
        self.store.get_outcome(entity_id)
    }
}

impl RequestProcessor<oracle_relayer_store::InMemoryStore> {
    /// Builds a processor from the relayer context, reporting to `observer`.
    pub fn from_context(
        ctx: &RelayerContext,
        observer: Arc<dyn RelayObserver>,
    ) -> Self {
        Self::new(
            ctx.directory(),
            ctx.resolver(),
            ctx.tx_submitter(),
            ctx.store().clone(),
            observer,
        )
    }
}

fn stage_of(error: &Error) -> SkipStage {
    match error {
        Error::Validation(_) => SkipStage::Validation,
        Error::Resolution(_) => SkipStage::Resolution,
        Error::Submission(_) => SkipStage::Submission,
        _ => SkipStage::Cache,
    }
}
