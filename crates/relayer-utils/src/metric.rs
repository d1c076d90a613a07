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

use prometheus::core::{AtomicF64, GenericCounter, GenericGauge};
use prometheus::{Encoder, Registry, TextEncoder};

/// A struct definition for collecting metrics in the relayer.
///
/// Every instance owns its own [`Registry`], so several relayers (or tests)
/// can live in the same process without clashing on metric names.
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    /// Request events found by the poller.
    pub requests_observed: GenericCounter<AtomicF64>,
    /// Requests resolved and fulfilled on chain.
    pub requests_fulfilled: GenericCounter<AtomicF64>,
    /// Requests dropped because of validation, resolution or submission errors.
    pub requests_skipped: GenericCounter<AtomicF64>,
    /// Fulfillment transactions that failed to estimate or send.
    pub submission_failures: GenericCounter<AtomicF64>,
    /// Ticks that failed to read the chain height or the request logs.
    pub poller_query_failures: GenericCounter<AtomicF64>,
    /// The last block scanned by the poller.
    pub watermark_block: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Instantiates the various metrics and their counters, also creates a registry for the counters and
    /// registers the counters
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_observed = GenericCounter::new(
            "requests_observed",
            "The total number of request events found on chain",
        )?;
        let requests_fulfilled = GenericCounter::new(
            "requests_fulfilled",
            "The total number of requests fulfilled on chain",
        )?;
        let requests_skipped = GenericCounter::new(
            "requests_skipped",
            "The total number of requests skipped because of an error",
        )?;
        let submission_failures = GenericCounter::new(
            "submission_failures",
            "How many fulfillment transactions failed to estimate or send",
        )?;
        let poller_query_failures = GenericCounter::new(
            "poller_query_failures",
            "How many times the poller failed to query the chain",
        )?;
        let watermark_block = GenericGauge::new(
            "watermark_block",
            "The last block number scanned for requests",
        )?;

        registry.register(Box::new(requests_observed.clone()))?;
        registry.register(Box::new(requests_fulfilled.clone()))?;
        registry.register(Box::new(requests_skipped.clone()))?;
        registry.register(Box::new(submission_failures.clone()))?;
        registry.register(Box::new(poller_query_failures.clone()))?;
        registry.register(Box::new(watermark_block.clone()))?;

        Ok(Self {
            registry,
            requests_observed,
            requests_fulfilled,
            requests_skipped,
            submission_failures,
            poller_query_failures,
            watermark_block,
        })
    }

    /// Gathers the whole relayer metrics in the prometheus text format.
    pub fn gather_metrics(&self) -> Result<String, GatherMetricsError> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        // Gather the metrics.
        let metric_families = self.registry.gather();
        // Encode them to send.
        encoder.encode(&metric_families, &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }
}

/// Errors while rendering the metrics.
#[derive(Debug, thiserror::Error)]
pub enum GatherMetricsError {
    /// Encoding failed.
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    /// The encoder produced invalid utf8.
    #[error(transparent)]
    FromUtf8Error(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instances_do_not_share_a_registry() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.requests_fulfilled.inc();
        assert_eq!(a.requests_fulfilled.get(), 1.0);
        assert_eq!(b.requests_fulfilled.get(), 0.0);
    }

    #[test]
    fn gathers_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.watermark_block.set(42.0);
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("watermark_block 42"));
        assert!(text.contains("# TYPE requests_observed counter"));
    }
}
