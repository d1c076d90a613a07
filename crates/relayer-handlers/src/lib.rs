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
//! Relayer handlers for HTTP calls

#![warn(missing_docs)]

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use oracle_relayer_context::RelayerContext;

/// Module handles relayer API
pub mod routes;

/// The `/api/v1` routes of the relayer.
pub fn api_router() -> Router<Arc<RelayerContext>> {
    Router::new()
        .route("/config", get(routes::handle_config))
        .route("/entities", get(routes::handle_entities))
        .route("/last-score/:entity_id", get(routes::handle_last_score))
        .route("/resolve-test/:entity_id", get(routes::handle_resolve_test))
        .route("/test-manual", post(routes::handle_manual_resolution))
        .route("/metrics", get(routes::handle_metric_info))
}

#[cfg(test)]
mod tests;
