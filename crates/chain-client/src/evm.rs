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
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::*;
use oracle_relayer_config::evm::EvmChainConfig;
use oracle_relayer_types::{Fulfillment, Request};
use oracle_relayer_utils::{Error, Result, SubmissionError};

abigen!(
    CreditScoreOracleContract,
    r#"[
        event CreditScoreRequested(bytes32 indexed requestId, address indexed requester, string userId, string userName, uint256 timestamp)
        event CreditScoreReceived(bytes32 indexed requestId, string userId, uint256 creditScore, uint256 timestamp, string ipfsCID)
        function fulfillCreditScore(bytes32 _requestId, string _userId, uint256 _creditScore, string _ipfsCID) external
    ]"#
);

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// A [`ChainClient`](crate::ChainClient) talking to an EVM node over HTTP,
/// signing fulfillments with the configured account.
#[derive(Clone)]
pub struct EthersChainClient {
    contract: CreditScoreOracleContract<SignerClient>,
    client: Arc<SignerClient>,
    chain_call_timeout: Duration,
    confirmation_timeout: Duration,
    block_confirmations: usize,
}

impl std::fmt::Debug for EthersChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthersChainClient")
            .field("sender", &self.client.address())
            .field("contract", &self.contract.address())
            .finish()
    }
}

impl EthersChainClient {
    /// Builds the client from the chain configuration.
    ///
    /// Fails with [`Error::MissingSecrets`] when there is no private key.
    pub fn new(config: &EvmChainConfig) -> Result<Self> {
        let private_key = config
            .private_key
            .as_ref()
            .ok_or(Error::MissingSecrets)?;
        let provider = Provider::<Http>::try_from(config.http_endpoint.as_str())?
            .interval(Duration::from_millis(1000));
        let wallet = LocalWallet::from_bytes(private_key.as_bytes())?
            .with_chain_id(config.chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract =
            CreditScoreOracleContract::new(config.contract_address, client.clone());
        Ok(Self {
            contract,
            client,
            chain_call_timeout: Duration::from_millis(config.chain_call_timeout),
            confirmation_timeout: Duration::from_millis(
                config.confirmation_timeout,
            ),
            block_confirmations: config.block_confirmations,
        })
    }

    fn fulfill_call(
        &self,
        call: &Fulfillment,
    ) -> ContractCall<SignerClient, ()> {
        self.contract.fulfill_credit_score(
            call.request_id.to_fixed_bytes(),
            call.entity_id.clone(),
            U256::from(call.value),
            call.data_locator.clone(),
        )
    }
}

/// Bounds `fut` by `timeout`, elapsing is an [`Error::Timeout`] naming `call`.
async fn bounded<F, T>(
    call: &'static str,
    timeout: Duration,
    fut: F,
) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::Timeout {
            call,
            timeout_ms: timeout.as_millis(),
        })
}

#[async_trait::async_trait]
impl crate::ChainClient for EthersChainClient {
    async fn block_number(&self) -> Result<u64> {
        let height = bounded(
            "eth_blockNumber",
            self.chain_call_timeout,
            self.client.get_block_number(),
        )
        .await?
        .map_err(|e| Error::ChainQuery(e.to_string()))?;
        Ok(height.as_u64())
    }

    #[tracing::instrument(skip(self))]
    async fn requests_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<Request>> {
        let filter = self
            .contract
            .credit_score_requested_filter()
            .from_block(from)
            .to_block(to);
        let logs =
            bounded("eth_getLogs", self.chain_call_timeout, filter.query_with_meta())
                .await?
                .map_err(|e| Error::ChainQuery(e.to_string()))?;
        let requests = logs
            .into_iter()
            .map(|(event, meta)| Request {
                request_id: H256::from(event.request_id),
                requester: Some(event.requester),
                entity_id: event.user_id,
                entity_name: event.user_name,
                source_block: meta.block_number.as_u64(),
                requested_at: u64::try_from(event.timestamp).ok(),
            })
            .collect();
        Ok(requests)
    }

    async fn estimate_fulfillment(
        &self,
        call: &Fulfillment,
    ) -> std::result::Result<U256, SubmissionError> {
        let tx = self.fulfill_call(call);
        bounded("eth_estimateGas", self.chain_call_timeout, tx.estimate_gas())
            .await
            .map_err(|e| SubmissionError::EstimationFailed(e.to_string()))?
            .map_err(|e| SubmissionError::EstimationFailed(e.to_string()))
    }

    async fn send_fulfillment(
        &self,
        call: &Fulfillment,
        gas: U256,
    ) -> std::result::Result<H256, SubmissionError> {
        let tx = self.fulfill_call(call).gas(gas);
        let pending =
            bounded("eth_sendTransaction", self.chain_call_timeout, tx.send())
                .await
                .map_err(|e| SubmissionError::SendFailed(e.to_string()))?
                .map_err(|e| SubmissionError::SendFailed(e.to_string()))?;
        let tx_hash = *pending;
        tracing::debug!("Tx 0x{:x} is submitted and pending!", tx_hash);
        let receipt = bounded(
            "transaction confirmation",
            self.confirmation_timeout,
            pending.confirmations(self.block_confirmations),
        )
        .await
        .map_err(|e| SubmissionError::SendFailed(format!("0x{tx_hash:x}: {e}")))?
        .map_err(|e| SubmissionError::SendFailed(format!("0x{tx_hash:x}: {e}")))?;
        match receipt {
            Some(receipt) => match receipt.status {
                Some(v) if v.is_zero() => Err(SubmissionError::SendFailed(
                    format!("0x{tx_hash:x} reverted"),
                )),
                _ => Ok(receipt.transaction_hash),
            },
            None => Err(SubmissionError::SendFailed(format!(
                "0x{tx_hash:x} dropped from mempool"
            ))),
        }
    }

    fn sender(&self) -> Address {
        self.client.address()
    }

    fn contract_address(&self) -> Address {
        self.contract.address()
    }
}
