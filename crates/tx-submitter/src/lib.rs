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
//! # Oracle Tx Submitter 🕸️
//!
//! Pushes resolved values back to the oracle contract. Every fulfillment is
//! dry-run first (gas estimation), a revert there never reaches the mempool.
//! Then it is sent with the estimated gas and the receipt is awaited.
//!
//! There is no retry, a failed fulfillment is reported and dropped.
//!
//! Submitters sharing a [`SubmissionLock`] never have two fulfillments in
//! flight at once, the lock is held from the estimation until the receipt.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use ethers::types::H256;
use oracle_chain_client::ChainClient;
use oracle_relayer_types::Fulfillment;
use oracle_relayer_utils::clickable_link::ClickableLink;
use oracle_relayer_utils::SubmissionError;

/// Serializes the fulfillments of one sending account, so their nonces are
/// assigned one after the other.
pub type SubmissionLock = Arc<tokio::sync::Mutex<()>>;

/// Sends fulfillments through a [`ChainClient`].
///
/// Clones share the same [`SubmissionLock`].
#[derive(Clone)]
pub struct TxSubmitter {
    client: Arc<dyn ChainClient>,
    chain_id: u64,
    explorer: Option<url::Url>,
    lock: SubmissionLock,
}

impl std::fmt::Debug for TxSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxSubmitter")
            .field("chain_id", &self.chain_id)
            .field("explorer", &self.explorer)
            .finish()
    }
}

impl TxSubmitter {
    /// Creates a new submitter, transactions are logged as links to
    /// `explorer` when one is given.
    pub fn new(
        client: Arc<dyn ChainClient>,
        chain_id: u64,
        explorer: Option<url::Url>,
    ) -> Self {
        Self {
            client,
            chain_id,
            explorer,
            lock: SubmissionLock::default(),
        }
    }

    /// Shares `lock` with every other submitter of the same account.
    #[must_use]
    pub fn with_lock(mut self, lock: SubmissionLock) -> Self {
        self.lock = lock;
        self
    }

    /// Estimates then sends `call`, returns the hash of the mined transaction.
    #[tracing::instrument(
        skip_all,
        fields(request_id = ?call.request_id, entity_id = %call.entity_id)
    )]
    pub async fn submit(
        &self,
        call: &Fulfillment,
    ) -> std::result::Result<H256, SubmissionError> {
        let chain_id = self.chain_id;
        // held until the receipt, the next fulfillment picks the next nonce.
        let _guard = self.lock.lock().await;
        let gas = match self.client.estimate_fulfillment(call).await {
            Ok(gas) => gas,
            Err(e) => {
                tracing::error!(
                    "Fulfillment of request {:?} would fail: {}",
                    call.request_id,
                    e
                );
                tracing::event!(
                    target: oracle_relayer_utils::probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %oracle_relayer_utils::probe::Kind::Submission,
                    ty = "EVM",
                    chain_id = %chain_id,
                    errored = true,
                    error = %e,
                    dry_run = "failed",
                    request_id = ?call.request_id,
                );
                return Err(e);
            }
        };
        tracing::event!(
            target: oracle_relayer_utils::probe::TARGET,
            tracing::Level::DEBUG,
            kind = %oracle_relayer_utils::probe::Kind::Submission,
            ty = "EVM",
            chain_id = %chain_id,
            dry_run = "passed",
            %gas,
            request_id = ?call.request_id,
        );

        match self.client.send_fulfillment(call, gas).await {
            Ok(tx_hash) => {
                let tx_hash_string = format!("0x{tx_hash:x}");
                if let Some(mut url) = self.explorer.clone() {
                    url.set_path(&format!("tx/{tx_hash_string}"));
                    let clickable_link =
                        ClickableLink::new(&tx_hash_string, url.as_str());
                    tracing::info!("Tx {} Finalized", clickable_link);
                } else {
                    tracing::info!("Tx {} Finalized", tx_hash_string);
                }
                tracing::event!(
                    target: oracle_relayer_utils::probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %oracle_relayer_utils::probe::Kind::Submission,
                    ty = "EVM",
                    chain_id = %chain_id,
                    finalized = true,
                    %tx_hash,
                    request_id = ?call.request_id,
                );
                Ok(tx_hash)
            }
            Err(e) => {
                tracing::error!(
                    "Error while sending the fulfillment of request {:?}: {}",
                    call.request_id,
                    e
                );
                tracing::event!(
                    target: oracle_relayer_utils::probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %oracle_relayer_utils::probe::Kind::Submission,
                    ty = "EVM",
                    chain_id = %chain_id,
                    errored = true,
                    error = %e,
                    request_id = ?call.request_id,
                );
                Err(e)
            }
        }
    }
}
