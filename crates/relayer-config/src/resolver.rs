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
use super::*;

/// ResolverConfig is the configuration for the off-chain data resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Gateway url templates, tried in order.
    ///
    /// `{locator}` is replaced by the data locator of the entity.
    #[serde(default = "defaults::gateways")]
    pub gateways: Vec<String>,
    /// Upper bound of a single gateway attempt in milliseconds.
    #[serde(
        rename(serialize = "attemptTimeout"),
        default = "defaults::attempt_timeout"
    )]
    pub attempt_timeout: u64,
    /// The JSON field of the payload holding the value.
    #[serde(rename(serialize = "valueField"), default = "defaults::value_field")]
    pub value_field: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            gateways: defaults::gateways(),
            attempt_timeout: defaults::attempt_timeout(),
            value_field: defaults::value_field(),
        }
    }
}
