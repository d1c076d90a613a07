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
//! # Oracle Relayer Store Module 🕸️
//!
//! A module for managing the state of the relayer.
//!
//! ## Overview
//!
//! The relayer store keeps how far the request watcher got on each contract,
//! and the latest resolved outcome of every entity. Everything lives in
//! memory, a restart starts over.
//!
use std::fmt::{Debug, Display};

use ethers::types::Address;
use oracle_relayer_types::ResolutionOutcome;
use oracle_relayer_utils::Result;

/// A module for managing in-memory storage of the relayer.
pub mod mem;

/// A store that uses in memory data structures as the backend.
pub use mem::InMemoryStore;

/// HistoryStoreKey contains the keys used to store the history of events.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HistoryStoreKey {
    /// A contract on a chain.
    Contract {
        /// The chain id.
        chain_id: u64,
        /// The contract address.
        address: Address,
    },
}

impl HistoryStoreKey {
    /// Returns the chain id of the chain this key is for.
    pub fn chain_id(&self) -> u64 {
        match self {
            HistoryStoreKey::Contract { chain_id, .. } => *chain_id,
        }
    }
    /// Returns the address of the contract this key is for.
    pub fn address(&self) -> Address {
        match self {
            HistoryStoreKey::Contract { address, .. } => *address,
        }
    }
}

impl Display for HistoryStoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contract { chain_id, address } => {
                write!(f, "Evm({chain_id}, {address:?})")
            }
        }
    }
}

impl From<(u64, Address)> for HistoryStoreKey {
    fn from((chain_id, address): (u64, Address)) -> Self {
        Self::Contract { chain_id, address }
    }
}

/// HistoryStore is a simple trait for storing and retrieving history
/// of block numbers.
pub trait HistoryStore: Clone + Send + Sync {
    /// Sets the new block number for that contract in the cache and returns the old one.
    fn set_last_block_number<K: Into<HistoryStoreKey> + Debug>(
        &self,
        key: K,
        block_number: u64,
    ) -> Result<u64>;
    /// Get the last block number for that contract.
    /// if not found, returns the `default_block_number`.
    fn get_last_block_number<K: Into<HistoryStoreKey> + Debug>(
        &self,
        key: K,
        default_block_number: u64,
    ) -> Result<u64>;

    /// an easy way to call the `get_last_block_number`
    /// where the default block number is `0`.
    fn get_last_block_number_or_default<K: Into<HistoryStoreKey> + Debug>(
        &self,
        key: K,
    ) -> Result<u64> {
        self.get_last_block_number(key, 0u64)
    }
}

/// The latest resolved outcome per entity.
///
/// Writes are unconditional overwrites, there is no expiry.
pub trait OutcomeCacheStore: Clone + Send + Sync {
    /// Stores `outcome` as the latest one of `entity_id`, returns the one it replaced.
    fn put_outcome(
        &self,
        entity_id: &str,
        outcome: ResolutionOutcome,
    ) -> Result<Option<ResolutionOutcome>>;
    /// The latest outcome of `entity_id`, if any.
    fn get_outcome(&self, entity_id: &str) -> Result<Option<ResolutionOutcome>>;
}
