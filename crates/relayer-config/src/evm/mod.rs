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
use ethers::types::Address;
use oracle_relayer_types::{private_key::PrivateKey, rpc_url::RpcUrl};

use super::*;

/// EvmChainConfig is the configuration for the EVM based network the oracle
/// contract is deployed on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvmChainConfig {
    /// String that groups configuration for this chain on a human-readable name.
    pub name: String,
    /// Http(s) Endpoint for quick Req/Res
    #[serde(skip_serializing)]
    pub http_endpoint: RpcUrl,
    /// Block Explorer for this chain.
    ///
    /// Optional, and only used for printing a clickable links
    /// for transactions and contracts.
    pub explorer: Option<url::Url>,
    /// chain specific id (output of chainId opcode on EVM networks)
    #[serde(rename(serialize = "chainId"))]
    pub chain_id: u64,
    /// The Private Key of the sending account on this network
    /// the format is more dynamic here:
    /// 1. if it starts with '0x' then this would be raw (64 bytes) hex encoded
    ///    private key.
    ///    Example: 0x8917174396171783496173419137618235192359106130478137647163400318
    ///
    /// 2. if it starts with '$' then it would be considered as an Enviroment variable
    ///    of a hex-encoded private key.
    ///   Example: $SEPOLIA_PRIVATE_KEY
    #[serde(skip_serializing)]
    pub private_key: Option<PrivateKey>,
    /// The address of the oracle contract.
    #[serde(rename(serialize = "contractAddress"))]
    pub contract_address: Address,
    /// The block to start watching from.
    ///
    /// When missing, the relayer starts from the chain height at startup and
    /// only sees new requests.
    #[serde(rename(serialize = "startBlock"), default)]
    pub start_block: Option<u64>,
    /// Polling interval in milliseconds
    #[serde(
        rename(serialize = "pollingInterval"),
        default = "defaults::polling_interval"
    )]
    pub polling_interval: u64,
    /// Upper bound, in milliseconds, of every chain RPC call.
    #[serde(skip_serializing, default = "defaults::chain_call_timeout")]
    pub chain_call_timeout: u64,
    /// Upper bound, in milliseconds, of waiting for a transaction receipt.
    #[serde(skip_serializing, default = "defaults::confirmation_timeout")]
    pub confirmation_timeout: u64,
    /// How many confirmations to wait for, `1` means the fulfillment got mined.
    #[serde(skip_serializing, default = "defaults::block_confirmations")]
    pub block_confirmations: usize,
}
