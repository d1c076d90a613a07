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
/// The default port the relayer will listen on. Defaults to 3001.
pub const fn relayer_port() -> u16 {
    3001
}
/// Polling interval of the request watcher, `5_000` ms by default.
pub const fn polling_interval() -> u64 {
    5_000
}
/// Upper bound of a single chain RPC call, `30_000` ms by default.
pub const fn chain_call_timeout() -> u64 {
    30_000
}
/// Upper bound of waiting for a transaction receipt, `120_000` ms by default.
pub const fn confirmation_timeout() -> u64 {
    120_000
}
/// Confirmations to wait for before a fulfillment counts as sent, `1` means mined.
pub const fn block_confirmations() -> usize {
    1
}
/// Upper bound of a single data source attempt, `10_000` ms by default.
pub const fn attempt_timeout() -> u64 {
    10_000
}

/// The payload field holding the resolved value.
pub fn value_field() -> String {
    String::from("creditScore")
}

/// The public IPFS gateways, in priority order.
pub fn gateways() -> Vec<String> {
    vec![
        String::from("https://ipfs.io/ipfs/{locator}"),
        String::from("https://cloudflare-ipfs.com/ipfs/{locator}"),
        String::from("https://gateway.pinata.cloud/ipfs/{locator}"),
    ]
}
