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
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # Oracle Relayer Types 🕸️
//!
//! The data model shared by the relay pipeline: the on-chain request, the
//! entity directory records, and the resolved outcome.

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

/// Private key wrapper that can be read from the environment.
pub mod private_key;
/// RPC url wrapper that can be read from the environment.
pub mod rpc_url;

/// A request for off-chain data, as emitted by the oracle contract.
///
/// Immutable once observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The opaque 32 bytes request identifier.
    pub request_id: H256,
    /// Who asked for the data, `None` for requests not coming from the chain.
    pub requester: Option<Address>,
    /// The entity the data is requested for.
    pub entity_id: String,
    /// The display name supplied on chain alongside the entity id.
    pub entity_name: String,
    /// The block where the request was emitted.
    pub source_block: u64,
    /// The on-chain timestamp of the request, in unix seconds, when known.
    pub requested_at: Option<u64>,
}

/// A known entity, provisioned through the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityRecord {
    /// Unique id of the entity.
    #[serde(rename(serialize = "entityId"))]
    pub entity_id: String,
    /// The name that requests must carry to be eligible.
    #[serde(rename(serialize = "displayName"))]
    pub display_name: String,
    /// Content identifier of the entity data, handed to the data sources.
    #[serde(rename(serialize = "dataLocator"))]
    pub data_locator: String,
}

/// The fulfillment call pushed back to the oracle contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
    /// The request being answered.
    pub request_id: H256,
    /// The entity the value belongs to.
    pub entity_id: String,
    /// The resolved value.
    pub value: u64,
    /// Where the value was resolved from.
    pub data_locator: String,
}

/// The latest known outcome for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOutcome {
    /// The entity this outcome belongs to.
    pub entity_id: String,
    /// The resolved value.
    pub value: u64,
    /// Where the value was resolved from.
    pub data_locator: String,
    /// When the outcome was submitted, in unix milliseconds.
    pub resolved_at: i64,
    /// The fulfillment transaction hash.
    pub tx_hash: H256,
}

impl ResolutionOutcome {
    /// Builds the outcome of a confirmed fulfillment.
    pub fn confirmed(
        fulfillment: &Fulfillment,
        tx_hash: H256,
        resolved_at: i64,
    ) -> Self {
        Self {
            entity_id: fulfillment.entity_id.clone(),
            value: fulfillment.value,
            data_locator: fulfillment.data_locator.clone(),
            resolved_at,
            tx_hash,
        }
    }
}
