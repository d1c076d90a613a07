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

#![warn(missing_docs)]
//! # Oracle Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.
use std::sync::Arc;

use tokio::sync::broadcast;

use oracle_chain_client::{ChainClient, EthersChainClient};
use oracle_data_source_backends::FallbackResolver;
use oracle_relayer_config::OracleRelayerConfig;
use oracle_relayer_store::{HistoryStoreKey, InMemoryStore};
use oracle_relayer_utils::metric::Metrics;
use oracle_request_validator::EntityDirectory;
use oracle_tx_submitter::{SubmissionLock, TxSubmitter};

/// RelayerContext contains Relayer's configuration, shared state and shutdown signal.
#[derive(Clone)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: OracleRelayerConfig,
    /// Broadcasts a shutdown signal to all active connections.
    ///
    /// The initial `shutdown` trigger is provided by the `run` caller. The
    /// server is responsible for gracefully shutting down active connections.
    /// When a connection task is spawned, it is passed a broadcast receiver
    /// handle. When a graceful shutdown is initiated, a `()` value is sent via
    /// the broadcast::Sender. Each active connection receives it, reaches a
    /// safe terminal state, and completes the task.
    notify_shutdown: broadcast::Sender<()>,
    /// Represents the metrics for the relayer
    pub metrics: Arc<Metrics>,
    store: InMemoryStore,
    directory: Arc<EntityDirectory>,
    resolver: Arc<FallbackResolver>,
    chain_client: Arc<dyn ChainClient>,
    /// Shared by every submitter, the relayer signs with a single account.
    submission_lock: SubmissionLock,
}

impl std::fmt::Debug for RelayerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerContext")
            .field("chain", &self.config.evm.name)
            .field("entities", &self.directory.len())
            .finish()
    }
}

impl RelayerContext {
    /// Creates a new RelayerContext, connected to the configured chain and
    /// gateways.
    pub fn new(
        config: OracleRelayerConfig,
    ) -> oracle_relayer_utils::Result<Self> {
        let chain_client = Arc::new(EthersChainClient::new(&config.evm)?);
        let resolver = FallbackResolver::from_config(&config.resolver)?;
        Self::with_backends(config, chain_client, resolver)
    }

    /// Creates a new RelayerContext over the given chain client and resolver.
    pub fn with_backends(
        config: OracleRelayerConfig,
        chain_client: Arc<dyn ChainClient>,
        resolver: FallbackResolver,
    ) -> oracle_relayer_utils::Result<Self> {
        let (notify_shutdown, _) = broadcast::channel(2);
        let metrics = Arc::new(Metrics::new()?);
        let directory = EntityDirectory::new(config.entities.iter().cloned())?;
        Ok(Self {
            config,
            notify_shutdown,
            metrics,
            store: InMemoryStore::default(),
            directory: Arc::new(directory),
            resolver: Arc::new(resolver),
            chain_client,
            submission_lock: SubmissionLock::default(),
        })
    }

    /// Returns a broadcast receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }
    /// Sends a shutdown signal to all subscribed tasks/connections.
    pub fn shutdown(&self) {
        let _ = self.notify_shutdown.send(());
    }

    /// Returns the in-memory store, holding the watermark and the result cache.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// The key the watermark of the oracle contract is stored under.
    pub fn history_store_key(&self) -> HistoryStoreKey {
        HistoryStoreKey::from((
            self.config.evm.chain_id,
            self.config.evm.contract_address,
        ))
    }

    /// Returns the entity directory.
    pub fn directory(&self) -> Arc<EntityDirectory> {
        self.directory.clone()
    }

    /// Returns the data resolver.
    pub fn resolver(&self) -> Arc<FallbackResolver> {
        self.resolver.clone()
    }

    /// Returns the chain client.
    pub fn chain_client(&self) -> Arc<dyn ChainClient> {
        self.chain_client.clone()
    }

    /// Returns a submitter sending fulfillments through the chain client.
    ///
    /// All the submitters of a context share one lock, so the poller and the
    /// manual resolutions never send concurrently.
    pub fn tx_submitter(&self) -> TxSubmitter {
        TxSubmitter::new(
            self.chain_client.clone(),
            self.config.evm.chain_id,
            self.config.evm.explorer.clone(),
        )
        .with_lock(self.submission_lock.clone())
    }
}

/// Listens for the server shutdown signal.
///
/// Shutdown is signalled using a `broadcast::Receiver`. Only a single value is
/// ever sent. Once a value has been sent via the broadcast channel, the server
/// should shutdown.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        // If the shutdown signal has already been received, then return
        // immediately.
        if self.shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;

        // Remember that the signal has been received.
        self.shutdown = true;
    }
}
