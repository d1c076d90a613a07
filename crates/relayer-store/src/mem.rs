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
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use oracle_relayer_types::ResolutionOutcome;
use parking_lot::RwLock;

use super::{HistoryStore, HistoryStoreKey, OutcomeCacheStore};

/// InMemoryStore is a store that keeps the relayer state in memory.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    last_block_numbers: Arc<RwLock<HashMap<HistoryStoreKey, u64>>>,
    outcomes: Arc<RwLock<HashMap<String, ResolutionOutcome>>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish()
    }
}

impl HistoryStore for InMemoryStore {
    #[tracing::instrument(skip(self))]
    fn get_last_block_number<K: Into<HistoryStoreKey> + Debug>(
        &self,
        key: K,
        default_block_number: u64,
    ) -> crate::Result<u64> {
        let guard = self.last_block_numbers.read();
        let val = guard
            .get(&key.into())
            .cloned()
            .unwrap_or(default_block_number);
        Ok(val)
    }

    #[tracing::instrument(skip(self))]
    fn set_last_block_number<K: Into<HistoryStoreKey> + Debug>(
        &self,
        key: K,
        block_number: u64,
    ) -> crate::Result<u64> {
        let mut guard = self.last_block_numbers.write();
        let val = guard.entry(key.into()).or_insert(block_number);
        let old = *val;
        *val = block_number;
        Ok(old)
    }
}

impl OutcomeCacheStore for InMemoryStore {
    #[tracing::instrument(skip(self, outcome))]
    fn put_outcome(
        &self,
        entity_id: &str,
        outcome: ResolutionOutcome,
    ) -> crate::Result<Option<ResolutionOutcome>> {
        let mut guard = self.outcomes.write();
        Ok(guard.insert(entity_id.to_owned(), outcome))
    }

    fn get_outcome(
        &self,
        entity_id: &str,
    ) -> crate::Result<Option<ResolutionOutcome>> {
        let guard = self.outcomes.read();
        Ok(guard.get(entity_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{Address, H256};

    use super::*;

    fn outcome(value: u64, locator: &str) -> ResolutionOutcome {
        ResolutionOutcome {
            entity_id: String::from("user001"),
            value,
            data_locator: locator.to_owned(),
            resolved_at: 1_700_000_000_000,
            tx_hash: H256::random(),
        }
    }

    #[test]
    fn later_outcome_replaces_earlier() {
        let store = InMemoryStore::default();
        assert_eq!(store.get_outcome("user001").unwrap(), None);

        let first = outcome(700, "bafy1");
        let second = outcome(720, "bafy2");
        assert_eq!(store.put_outcome("user001", first.clone()).unwrap(), None);
        assert_eq!(
            store.put_outcome("user001", second.clone()).unwrap(),
            Some(first)
        );
        assert_eq!(store.get_outcome("user001").unwrap(), Some(second));
        assert_eq!(store.get_outcome("user002").unwrap(), None);
    }

    #[test]
    fn last_block_number_is_per_contract() {
        let store = InMemoryStore::default();
        let a = (11155111u64, Address::repeat_byte(1));
        let b = (11155111u64, Address::repeat_byte(2));
        assert_eq!(store.get_last_block_number(a, 42).unwrap(), 42);
        assert_eq!(store.set_last_block_number(a, 100).unwrap(), 100);
        assert_eq!(store.set_last_block_number(a, 120).unwrap(), 100);
        assert_eq!(store.get_last_block_number_or_default(a).unwrap(), 120);
        assert_eq!(store.get_last_block_number_or_default(b).unwrap(), 0);
    }

    #[tokio::test]
    async fn clones_share_state_across_tasks() {
        let store = InMemoryStore::default();
        let writer = store.clone();
        tokio::spawn(async move {
            writer.put_outcome("user001", outcome(650, "bafy")).unwrap();
        })
        .await
        .unwrap();
        assert_eq!(store.get_outcome("user001").unwrap().unwrap().value, 650);
    }
}
