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
//! # Oracle Event Watcher 🕸️
//!
//! The relay pipeline. The [`RequestPoller`] scans the oracle contract for
//! new request events one block range at a time, and hands every request to
//! the [`RequestProcessor`] which validates it, resolves its data and sends
//! the fulfillment back on chain.
//!
//! Progress is reported to a [`RelayObserver`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Relay observers
mod observer;
/// The block range poller
mod poller;
/// Per request processing
mod processor;

pub use observer::{
    RecordingObserver, RelayEvent, RelayObserver, SkipStage, TracingObserver,
};
pub use poller::{RequestPoller, TickOutcome};
pub use processor::RequestProcessor;

#[cfg(test)]
mod tests;
