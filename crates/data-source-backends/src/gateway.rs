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
//! Data Source implementation for HTTP gateways

use oracle_relayer_utils::SourceFailure;

/// The placeholder replaced by the data locator in a gateway template.
pub const LOCATOR_PLACEHOLDER: &str = "{locator}";

/// A backend fetching payloads from an HTTP gateway
#[derive(Clone)]
pub struct HttpGateway {
    template: String,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Creates a new `HttpGateway` for the url `template`, `{locator}`
    /// gets replaced with the requested locator.
    #[must_use]
    pub fn new(template: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            template: template.into(),
            client,
        }
    }

    /// The url the payload of `locator` is fetched from.
    #[must_use]
    pub fn url_for(&self, locator: &str) -> String {
        self.template.replace(LOCATOR_PLACEHOLDER, locator)
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("template", &self.template)
            .finish()
    }
}

#[async_trait::async_trait]
impl super::DataSource for HttpGateway {
    fn name(&self, locator: &str) -> String {
        self.url_for(locator)
    }

    async fn fetch(
        &self,
        locator: &str,
    ) -> std::result::Result<super::Payload, SourceFailure> {
        let url = self.url_for(locator);
        tracing::trace!("Fetching {}", url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceFailure::Timeout
            } else {
                SourceFailure::Transport(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceFailure::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceFailure::Transport(e.to_string()))?;
        serde_json::from_slice(&body)
            .map_err(|e| SourceFailure::MalformedBody(e.to_string()))
    }
}
