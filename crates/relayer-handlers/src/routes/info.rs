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

use axum::extract::State;
use axum::Json;
use ethers::types::Address;
use oracle_relayer_config::evm::EvmChainConfig;
use oracle_relayer_context::RelayerContext;
use oracle_relayer_store::HistoryStore;
use oracle_relayer_utils::HandlerError;
use serde::Serialize;

/// Relayer information response struct
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerInformationResponse {
    message: &'static str,
    account: Address,
    contract: Address,
    network: String,
    polling_interval: u64,
    last_checked_block: u64,
    entities: Vec<String>,
}

/// Handles relayer information requests
///
/// Returns a Result with the `RelayerInformationResponse` on success
pub async fn handle_relayer_info(
    State(ctx): State<Arc<RelayerContext>>,
) -> Result<Json<RelayerInformationResponse>, HandlerError> {
    let chain_client = ctx.chain_client();
    let last_checked_block = ctx
        .store()
        .get_last_block_number_or_default(ctx.history_store_key())?;
    let entities = ctx
        .directory()
        .records()
        .into_iter()
        .map(|r| r.entity_id.clone())
        .collect();
    Ok(Json(RelayerInformationResponse {
        message: "Oracle relayer is running",
        account: chain_client.sender(),
        contract: chain_client.contract_address(),
        network: ctx.config.evm.name.clone(),
        polling_interval: ctx.config.evm.polling_interval,
        last_checked_block,
        entities,
    }))
}

/// Relayer configuration response struct
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerConfigurationResponse {
    /// The chain configuration, secrets are never serialized.
    #[serde(flatten)]
    evm: EvmChainConfig,
    account: Address,
}

/// Handles relayer configuration requests
///
/// Returns a Result with the `RelayerConfigurationResponse` on success
pub async fn handle_config(
    State(ctx): State<Arc<RelayerContext>>,
) -> Json<RelayerConfigurationResponse> {
    Json(RelayerConfigurationResponse {
        evm: ctx.config.evm.clone(),
        account: ctx.chain_client().sender(),
    })
}
