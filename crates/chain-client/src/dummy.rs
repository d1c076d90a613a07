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
use std::time::Duration;

use ethers::types::{Address, H256, U256};
use oracle_relayer_types::{Fulfillment, Request};
use oracle_relayer_utils::{Error, Result, SubmissionError};
use parking_lot::Mutex;

/// A Dummy Chain Client
///
/// An in-memory chain whose height, request logs and failures are scripted
/// by the caller. Every call is recorded so it can be inspected afterwards.
#[derive(Debug, Default)]
pub struct DummyChainClient {
    state: Mutex<DummyState>,
}

#[derive(Debug, Default)]
struct DummyState {
    height: u64,
    requests: Vec<Request>,
    fail_queries: bool,
    estimate_error: Option<String>,
    send_error: Option<String>,
    height_reads: usize,
    queried_ranges: Vec<(u64, u64)>,
    estimates: Vec<Fulfillment>,
    sent: Vec<(Fulfillment, U256)>,
    send_delay: Option<Duration>,
    sends_in_flight: usize,
    max_sends_in_flight: usize,
}

impl DummyChainClient {
    /// The gas every estimation returns.
    pub const GAS_ESTIMATE: u64 = 90_000;

    /// Creates a new dummy chain at the given height.
    #[must_use]
    pub fn new(height: u64) -> Self {
        let client = Self::default();
        client.state.lock().height = height;
        client
    }

    /// Moves the chain to `height`.
    pub fn set_height(&self, height: u64) {
        self.state.lock().height = height;
    }

    /// Emits `request` at its `source_block`.
    pub fn push_request(&self, request: Request) {
        self.state.lock().requests.push(request);
    }

    /// Makes height and log queries fail (or succeed again).
    pub fn fail_queries(&self, fail: bool) {
        self.state.lock().fail_queries = fail;
    }

    /// Makes every gas estimation revert with `reason`.
    pub fn reject_estimation(&self, reason: &str) {
        self.state.lock().estimate_error = Some(reason.to_owned());
    }

    /// Makes every send fail with `reason`.
    pub fn fail_sends(&self, reason: &str) {
        self.state.lock().send_error = Some(reason.to_owned());
    }

    /// Makes every send take `delay` before it is mined.
    pub fn delay_sends(&self, delay: Duration) {
        self.state.lock().send_delay = Some(delay);
    }

    /// The highest number of sends that were pending at the same time.
    pub fn max_sends_in_flight(&self) -> usize {
        self.state.lock().max_sends_in_flight
    }

    /// How many times the height was read.
    pub fn height_reads(&self) -> usize {
        self.state.lock().height_reads
    }

    /// Every `(from, to)` range queried for requests, in order.
    pub fn queried_ranges(&self) -> Vec<(u64, u64)> {
        self.state.lock().queried_ranges.clone()
    }

    /// Every fulfillment gas was estimated for, in order.
    pub fn estimates(&self) -> Vec<Fulfillment> {
        self.state.lock().estimates.clone()
    }

    /// Every fulfillment sent with its gas limit, in order.
    pub fn sent(&self) -> Vec<(Fulfillment, U256)> {
        self.state.lock().sent.clone()
    }
}

#[async_trait::async_trait]
impl crate::ChainClient for DummyChainClient {
    async fn block_number(&self) -> Result<u64> {
        let mut state = self.state.lock();
        state.height_reads += 1;
        if state.fail_queries {
            return Err(Error::ChainQuery(String::from("connection refused")));
        }
        Ok(state.height)
    }

    async fn requests_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<Request>> {
        let mut state = self.state.lock();
        if state.fail_queries {
            return Err(Error::ChainQuery(String::from("connection refused")));
        }
        state.queried_ranges.push((from, to));
        let requests = state
            .requests
            .iter()
            .filter(|r| (from..=to).contains(&r.source_block))
            .cloned()
            .collect();
        Ok(requests)
    }

    async fn estimate_fulfillment(
        &self,
        call: &Fulfillment,
    ) -> std::result::Result<U256, SubmissionError> {
        let mut state = self.state.lock();
        state.estimates.push(call.clone());
        match &state.estimate_error {
            Some(reason) => Err(SubmissionError::EstimationFailed(reason.clone())),
            None => Ok(U256::from(Self::GAS_ESTIMATE)),
        }
    }

    async fn send_fulfillment(
        &self,
        call: &Fulfillment,
        gas: U256,
    ) -> std::result::Result<H256, SubmissionError> {
        let delay = {
            let mut state = self.state.lock();
            state.sends_in_flight += 1;
            state.max_sends_in_flight =
                state.max_sends_in_flight.max(state.sends_in_flight);
            state.send_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock();
        state.sends_in_flight -= 1;
        if let Some(reason) = &state.send_error {
            return Err(SubmissionError::SendFailed(reason.clone()));
        }
        state.sent.push((call.clone(), gas));
        Ok(H256::from_low_u64_be(state.sent.len() as u64))
    }

    fn sender(&self) -> Address {
        Address::repeat_byte(0xaa)
    }

    fn contract_address(&self) -> Address {
        Address::repeat_byte(0xcc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChainClient;

    fn request(block: u64) -> Request {
        Request {
            request_id: H256::from_low_u64_be(block),
            requester: None,
            entity_id: String::from("user001"),
            entity_name: String::from("John Doe"),
            source_block: block,
            requested_at: None,
        }
    }

    #[tokio::test]
    async fn returns_requests_of_the_range_only() {
        let chain = DummyChainClient::new(10);
        chain.push_request(request(3));
        chain.push_request(request(7));
        chain.push_request(request(11));
        let found = chain.requests_in_range(4, 10).await.unwrap();
        assert_eq!(found, vec![request(7)]);
        assert_eq!(chain.queried_ranges(), vec![(4, 10)]);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let chain = DummyChainClient::new(10);
        chain.fail_queries(true);
        assert!(chain.block_number().await.is_err());
        assert_eq!(chain.height_reads(), 1);

        let call = Fulfillment {
            request_id: H256::zero(),
            entity_id: String::from("user001"),
            value: 720,
            data_locator: String::from("bafy"),
        };
        chain.reject_estimation("execution reverted");
        assert_eq!(
            chain.estimate_fulfillment(&call).await,
            Err(SubmissionError::EstimationFailed(String::from(
                "execution reverted"
            )))
        );
        chain.fail_sends("nonce too low");
        assert!(chain.send_fulfillment(&call, U256::one()).await.is_err());
        assert!(chain.sent().is_empty());
    }
}
