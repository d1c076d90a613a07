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
//! # Oracle Request Validator 🕸️
//!
//! Checks incoming requests against the entity directory, a request is only
//! eligible for resolution when its entity is known and the name it carries
//! is exactly the one on record.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;

use oracle_relayer_types::{EntityRecord, Request};
use oracle_relayer_utils::{Error, Result, ValidationError};

/// The known entities, by id.
#[derive(Debug, Clone, Default)]
pub struct EntityDirectory {
    records: HashMap<String, EntityRecord>,
}

impl EntityDirectory {
    /// Builds the directory, a duplicated entity id is an error.
    pub fn new(records: impl IntoIterator<Item = EntityRecord>) -> Result<Self> {
        let mut map = HashMap::new();
        for record in records {
            if map.contains_key(&record.entity_id) {
                return Err(Error::DuplicateEntity(record.entity_id));
            }
            map.insert(record.entity_id.clone(), record);
        }
        Ok(Self { records: map })
    }

    /// Checks `request` against the directory and returns the matching record.
    ///
    /// Names are compared byte for byte, there is no case or whitespace
    /// normalization.
    pub fn validate(
        &self,
        request: &Request,
    ) -> std::result::Result<EntityRecord, ValidationError> {
        self.check(&request.entity_id, &request.entity_name)
    }

    /// Same as [`Self::validate`], for an entity id and name pair.
    pub fn check(
        &self,
        entity_id: &str,
        entity_name: &str,
    ) -> std::result::Result<EntityRecord, ValidationError> {
        let record = self.records.get(entity_id).ok_or_else(|| {
            ValidationError::NotFound {
                entity_id: entity_id.to_owned(),
            }
        })?;
        if record.display_name != entity_name {
            tracing::debug!(
                "Name mismatch for {}: expected {:?}, got {:?}",
                entity_id,
                record.display_name,
                entity_name
            );
            return Err(ValidationError::NameMismatch {
                entity_id: entity_id.to_owned(),
                expected: record.display_name.clone(),
                found: entity_name.to_owned(),
            });
        }
        Ok(record.clone())
    }

    /// Looks an entity up by id.
    pub fn get(&self, entity_id: &str) -> Option<&EntityRecord> {
        self.records.get(entity_id)
    }

    /// All the known entities, sorted by id.
    pub fn records(&self) -> Vec<&EntityRecord> {
        let mut records = self.records.values().collect::<Vec<_>>();
        records.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        records
    }

    /// How many entities are known.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
