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
//! # Relayer Service Module 🕸️
//!
//! A module for starting long-running tasks for event watching.
//!
//! ## Overview
//!
//! Services are tasks which the relayer constantly runs throughout its lifetime.
//! Services handle keeping up to date with the configured chain.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use oracle_event_watcher::{RequestPoller, TracingObserver};
use oracle_relayer_context::RelayerContext;
use oracle_relayer_handlers::routes::handle_relayer_info;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the routes of the relayer API.
///
/// # Arguments
///
/// * `ctx` - RelayContext that holds the configuration and shared state
pub fn build_router(ctx: RelayerContext) -> Router {
    Router::new()
        .route("/", get(handle_relayer_info))
        .nest("/api/v1", oracle_relayer_handlers::api_router())
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(ctx))
}

/// Sets up the web server for the relayer, routing (endpoint queries / requests mapped to
/// handled code). Allows clients to interact with the relayer.
///
/// # Arguments
///
/// * `ctx` - RelayContext that holds the configuration and shared state
pub async fn build_web_services(ctx: RelayerContext) -> crate::Result<()> {
    let socket_addr = SocketAddr::new([0, 0, 0, 0].into(), ctx.config.port);
    let mut shutdown = ctx.shutdown_signal();
    let app = build_router(ctx).into_make_service();

    tracing::info!("Starting the server on {}", socket_addr);
    axum::Server::bind(&socket_addr)
        .serve(app)
        .with_graceful_shutdown(async move { shutdown.recv().await })
        .await?;
    Ok(())
}

/// Starts the request poller of the configured oracle contract.
///
/// The watermark is initialized before returning, so an unreachable chain
/// fails the startup. The poller then runs on a background task until the
/// shutdown signal fires.
///
/// # Arguments
///
/// * `ctx` - RelayContext reference that holds the configuration
pub async fn ignite(ctx: &RelayerContext) -> crate::Result<()> {
    tracing::trace!(
        "Relayer configuration: {}",
        serde_json::to_string_pretty(&ctx.config)?
    );
    let observer = Arc::new(TracingObserver::new(ctx.metrics.clone()));
    let poller = RequestPoller::from_context(ctx, observer);
    let watermark = poller.initialize(ctx.config.evm.start_block).await?;
    tracing::info!(
        "Watching {} on {} from block #{}",
        ctx.config.evm.contract_address,
        ctx.config.evm.name,
        watermark.saturating_add(1),
    );
    let polling_interval =
        Duration::from_millis(ctx.config.evm.polling_interval);
    let shutdown_signal = ctx.shutdown_signal();
    let task = async move {
        poller.run(polling_interval, shutdown_signal).await?;
        crate::Result::Ok(())
    };
    // kick off the watcher.
    tokio::task::spawn(task);
    Ok(())
}
