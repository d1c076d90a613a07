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

use oracle_relayer_config::resolver::ResolverConfig;
use oracle_relayer_utils::{ResolutionError, SourceAttempt, SourceFailure};

/// The payload of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The value read from the payload.
    pub value: u64,
    /// The source that served the payload.
    pub source: String,
    /// The failed attempts made before reaching `source`, in priority order.
    pub attempts: Vec<SourceAttempt>,
}

/// A Fallback Resolver is a resolver that builds on top of data sources and
/// returns the payload of the first one that answers.
///
/// ## Semantics
///
/// The sources are tried one at a time, in the order they were added:
/// - A source that times out, cannot be reached, answers with a non-2xx
///   status or with a body that is not JSON is skipped, and the next one is
///   tried.
/// - The first JSON payload wins, later sources are never asked.
/// - A winning payload without a non-negative integer under the value field
///   fails the whole resolution, the remaining sources are not tried.
///
/// Nothing is cached, every call asks the sources again.
pub struct FallbackResolver {
    /// The underlying sources, by priority
    sources: Vec<Box<dyn super::DataSource>>,
    attempt_timeout: Duration,
    value_field: String,
}

impl FallbackResolver {
    /// Creates a new `FallbackResolverBuilder`
    #[must_use]
    pub fn builder() -> FallbackResolverBuilder {
        FallbackResolverBuilder {
            sources: Vec::default(),
            attempt_timeout: Duration::from_millis(
                oracle_relayer_config::defaults::attempt_timeout(),
            ),
            value_field: oracle_relayer_config::defaults::value_field(),
        }
    }

    /// Builds a resolver over the configured HTTP gateways.
    pub fn from_config(
        config: &ResolverConfig,
    ) -> oracle_relayer_utils::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.attempt_timeout))
            .build()?;
        let builder = config.gateways.iter().fold(
            Self::builder()
                .attempt_timeout(Duration::from_millis(config.attempt_timeout))
                .value_field(&config.value_field),
            |builder, template| {
                builder.fallback(Box::new(super::HttpGateway::new(
                    template.clone(),
                    client.clone(),
                )))
            },
        );
        Ok(builder.build())
    }

    /// How many sources are configured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolves the value stored under `data_locator` for `entity_id`.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        entity_id: &str,
        data_locator: &str,
    ) -> std::result::Result<Resolution, ResolutionError> {
        let mut attempts = Vec::new();
        for source in &self.sources {
            let name = source.name(data_locator);
            let fetched = tokio::time::timeout(
                self.attempt_timeout,
                source.fetch(data_locator),
            )
            .await
            .unwrap_or(Err(SourceFailure::Timeout));
            let payload = match fetched {
                Ok(payload) => payload,
                Err(failure) => {
                    tracing::warn!("{} failed: {}", name, failure);
                    attempts.push(SourceAttempt {
                        source: name,
                        failure,
                    });
                    continue;
                }
            };
            let value = extract_value(&payload, &self.value_field).map_err(
                |reason| ResolutionError::InvalidPayload {
                    source_name: name.clone(),
                    reason,
                },
            )?;
            tracing::event!(
                target: oracle_relayer_utils::probe::TARGET,
                tracing::Level::DEBUG,
                kind = %oracle_relayer_utils::probe::Kind::Resolver,
                entity_id = %entity_id,
                source = %name,
                failed_attempts = attempts.len(),
                value,
            );
            return Ok(Resolution {
                value,
                source: name,
                attempts,
            });
        }
        Err(ResolutionError::AllSourcesUnavailable {
            locator: data_locator.to_owned(),
            attempts,
        })
    }
}

/// A builder for the `FallbackResolver`
pub struct FallbackResolverBuilder {
    sources: Vec<Box<dyn super::DataSource>>,
    attempt_timeout: Duration,
    value_field: String,
}

impl FallbackResolverBuilder {
    /// Adds a source, tried after every source added before it.
    #[must_use]
    pub fn fallback(mut self, source: Box<dyn super::DataSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Bounds every single attempt.
    #[must_use]
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// The payload field holding the value.
    #[must_use]
    pub fn value_field(mut self, field: &str) -> Self {
        self.value_field = field.to_owned();
        self
    }

    /// Builds the `FallbackResolver`
    #[must_use]
    pub fn build(self) -> FallbackResolver {
        FallbackResolver {
            sources: self.sources,
            attempt_timeout: self.attempt_timeout,
            value_field: self.value_field,
        }
    }
}

/// Reads a non-negative integer from `payload[field]`, given either as a JSON
/// number or as a decimal string.
fn extract_value(
    payload: &super::Payload,
    field: &str,
) -> std::result::Result<u64, String> {
    match payload.get(field) {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| format!("`{field}` is not a non-negative integer: {n}")),
        Some(serde_json::Value::String(s)) => s.trim().parse().map_err(|_| {
            format!("`{field}` is not a non-negative integer: {s:?}")
        }),
        Some(other) => {
            Err(format!("`{field}` is not a non-negative integer: {other}"))
        }
        None => Err(format!("missing `{field}`")),
    }
}
