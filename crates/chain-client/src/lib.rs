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
//! # Oracle Chain Client 🕸️
//!
//! The seam between the relayer and the chain hosting the oracle contract.
//! The relay pipeline only needs four calls: the chain height, the request
//! events of a block range, and estimating then sending a fulfillment.
//!
//! As of now, the following clients are provided:
//! - [`EthersChainClient`], an `ethers` signer middleware over HTTP.
//! - [`DummyChainClient`], a scripted in-memory chain, for tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use ethers::types::{Address, H256, U256};
use oracle_relayer_types::{Fulfillment, Request};
use oracle_relayer_utils::{Result, SubmissionError};

/// A scripted chain client
mod dummy;
/// The `ethers` chain client
mod evm;

pub use dummy::DummyChainClient;
pub use evm::{CreditScoreOracleContract, EthersChainClient};

/// Everything the relayer asks from the chain.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// The current chain height.
    async fn block_number(&self) -> Result<u64>;

    /// The requests emitted in `from..=to`, in log order.
    async fn requests_in_range(&self, from: u64, to: u64)
        -> Result<Vec<Request>>;

    /// Estimates the gas needed by the fulfillment call.
    ///
    /// A revert or any RPC error is an [`SubmissionError::EstimationFailed`].
    async fn estimate_fulfillment(
        &self,
        call: &Fulfillment,
    ) -> std::result::Result<U256, SubmissionError>;

    /// Sends the fulfillment with the given gas limit and waits for it to be
    /// mined, returns the transaction hash.
    async fn send_fulfillment(
        &self,
        call: &Fulfillment,
        gas: U256,
    ) -> std::result::Result<H256, SubmissionError>;

    /// The account that signs the fulfillments.
    fn sender(&self) -> Address;

    /// The oracle contract address.
    fn contract_address(&self) -> Address;
}
