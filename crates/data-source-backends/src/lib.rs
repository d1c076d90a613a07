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
//! Data Source Backends
//!
//! A Data Source is a service that serves the off-chain payload of an entity,
//! addressed by its data locator (an IPFS content identifier for the public
//! gateways). The payload is a JSON document carrying the value to push back
//! on chain.
//!
//! Sources are combined by the [`FallbackResolver`], which tries them in
//! priority order and stops at the first one that answers.
//!
//! As of now, the following backends are supported:
//! - [`HttpGateway`], any HTTP gateway with a `{locator}` url template.
//!
//! ## Usage
//! ```rust,no_run
//! use std::time::Duration;
//! use oracle_data_source_backends::{FallbackResolver, HttpGateway};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = reqwest::Client::new();
//! let resolver = FallbackResolver::builder()
//!     .attempt_timeout(Duration::from_secs(10))
//!     .fallback(Box::new(HttpGateway::new("https://ipfs.io/ipfs/{locator}", client.clone())))
//!     .fallback(Box::new(HttpGateway::new("https://cloudflare-ipfs.com/ipfs/{locator}", client)))
//!     .build();
//! let resolution = resolver.resolve("user001", "bafy...").await?;
//! println!("{} from {}", resolution.value, resolution.source);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use oracle_relayer_utils::SourceFailure;

/// A Dummy Data Source
mod dummy;
/// The Fallback Resolver
mod fallback;
/// HTTP Gateway Backend
mod gateway;

pub use dummy::{DummyBehavior, DummyDataSource};
pub use fallback::{FallbackResolver, FallbackResolverBuilder, Resolution};
pub use gateway::HttpGateway;

/// A type alias for the structured payload served by a data source.
pub type Payload = serde_json::Value;

/// A trait for a data source
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// A human readable name of the source for `locator`, usually the full url.
    fn name(&self, locator: &str) -> String;

    /// Fetches the payload stored under `locator`.
    ///
    /// The caller bounds the call with its own timeout.
    async fn fetch(
        &self,
        locator: &str,
    ) -> std::result::Result<Payload, SourceFailure>;
}
