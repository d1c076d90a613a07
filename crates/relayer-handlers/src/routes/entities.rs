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
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use oracle_relayer_context::RelayerContext;
use oracle_relayer_types::EntityRecord;

/// Lists the entity directory, sorted by entity id.
pub async fn handle_entities(
    State(ctx): State<Arc<RelayerContext>>,
) -> Json<Vec<EntityRecord>> {
    let directory = ctx.directory();
    Json(directory.records().into_iter().cloned().collect())
}
