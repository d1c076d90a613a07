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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use oracle_relayer_utils::SourceFailure;

/// What a [`DummyDataSource`] does when asked for a payload.
#[derive(Debug, Clone)]
pub enum DummyBehavior {
    /// Always serves this payload.
    Serve(super::Payload),
    /// Always fails with this failure.
    Fail(SourceFailure),
    /// Never answers.
    Hang,
}

/// A Dummy Data Source
///
/// This backend is useful for testing purposes, it always behaves the way it
/// was configured initially while creating the backend, and counts how many
/// times it was asked. Clones share the counter.
#[derive(Debug, Clone)]
pub struct DummyDataSource {
    name: String,
    behavior: DummyBehavior,
    calls: Arc<AtomicUsize>,
}

impl DummyDataSource {
    /// Creates a new dummy data source
    #[must_use]
    pub fn new(name: impl Into<String>, behavior: DummyBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            calls: Arc::default(),
        }
    }

    /// How many times a payload was requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl super::DataSource for DummyDataSource {
    fn name(&self, _locator: &str) -> String {
        self.name.clone()
    }

    async fn fetch(
        &self,
        _locator: &str,
    ) -> std::result::Result<super::Payload, SourceFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            DummyBehavior::Serve(payload) => Ok(payload.clone()),
            DummyBehavior::Fail(failure) => Err(failure.clone()),
            DummyBehavior::Hang => futures::future::pending().await,
        }
    }
}
