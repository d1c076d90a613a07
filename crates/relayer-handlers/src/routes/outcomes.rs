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

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use oracle_relayer_context::RelayerContext;
use oracle_relayer_store::OutcomeCacheStore;
use oracle_relayer_types::ResolutionOutcome;
use oracle_relayer_utils::HandlerError;

/// Handles the latest outcome of an entity.
///
/// Returns a Result with the cached `ResolutionOutcome` on success
///
/// # Arguments
///
/// * `entity_id` - The id of the entity.
pub async fn handle_last_score(
    State(ctx): State<Arc<RelayerContext>>,
    Path(entity_id): Path<String>,
) -> Result<Json<ResolutionOutcome>, HandlerError> {
    match ctx.store().get_outcome(&entity_id)? {
        Some(outcome) => Ok(Json(outcome)),
        None => Err(HandlerError(
            StatusCode::NOT_FOUND,
            String::from("No score yet for this user"),
        )),
    }
}
