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
use oracle_event_watcher::{RequestProcessor, TracingObserver};
use oracle_relayer_context::RelayerContext;
use oracle_relayer_types::ResolutionOutcome;
use oracle_relayer_utils::{HandlerError, ValidationError};
use serde::{Deserialize, Serialize};

/// Resolution test response struct
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveTestResponse {
    entity_id: String,
    data_locator: String,
    value: u64,
    source: String,
    failed_attempts: Vec<String>,
}

/// Resolves the data of a known entity, without sending anything on chain.
///
/// # Arguments
///
/// * `entity_id` - The id of the entity.
pub async fn handle_resolve_test(
    State(ctx): State<Arc<RelayerContext>>,
    Path(entity_id): Path<String>,
) -> Result<Json<ResolveTestResponse>, HandlerError> {
    let directory = ctx.directory();
    let record = directory.get(&entity_id).ok_or_else(|| {
        oracle_relayer_utils::Error::from(ValidationError::NotFound {
            entity_id: entity_id.clone(),
        })
    })?;
    let resolution = ctx
        .resolver()
        .resolve(&record.entity_id, &record.data_locator)
        .await
        .map_err(|e| {
            tracing::warn!("Test resolution of {} failed: {}", entity_id, e);
            HandlerError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(ResolveTestResponse {
        entity_id: record.entity_id.clone(),
        data_locator: record.data_locator.clone(),
        value: resolution.value,
        source: resolution.source,
        failed_attempts: resolution
            .attempts
            .iter()
            .map(ToString::to_string)
            .collect(),
    }))
}

/// Manual resolution request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualResolutionRequest {
    user_id: Option<String>,
    user_name: Option<String>,
}

/// Runs the whole pipeline for an entity, outside of the event log.
///
/// Returns the cached `ResolutionOutcome` on success.
pub async fn handle_manual_resolution(
    State(ctx): State<Arc<RelayerContext>>,
    Json(payload): Json<ManualResolutionRequest>,
) -> Result<Json<ResolutionOutcome>, HandlerError> {
    let (entity_id, display_name) = match (payload.user_id, payload.user_name)
    {
        (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => {
            (id, name)
        }
        _ => {
            return Err(HandlerError(
                StatusCode::BAD_REQUEST,
                String::from("userId and userName required"),
            ))
        }
    };
    tracing::debug!("Manual resolution requested for {}", entity_id);
    let observer = Arc::new(TracingObserver::new(ctx.metrics.clone()));
    let processor = RequestProcessor::from_context(&ctx, observer);
    let outcome = processor
        .trigger_manual_resolution(&entity_id, &display_name)
        .await?;
    Ok(Json(outcome))
}
