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

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # Oracle Relayer Utils 🕸️
//!
//! Shared error types, probes and metrics for every crate of the relayer.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ethers::providers::ProviderError;

/// Helper to print clickable links in the terminal.
pub mod clickable_link;
/// Metrics functionality
pub mod metric;
/// A module used for debugging relayer lifecycle, sync state, or other relayer state.
pub mod probe;

/// An enum of all possible errors that could be encountered during the execution of the Oracle
/// Relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// HTTP Error
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    /// Error in Http Provider (ethers client).
    #[error(transparent)]
    EthersProvider(#[from] ProviderError),
    /// Ether wallet errors.
    #[error(transparent)]
    EtherWalletError(#[from] ethers::signers::WalletError),
    /// Reqwest error
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// Prometheus error.
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    /// Error while parsing the config files.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
    /// Missing Secrets in the config, the sending private key.
    #[error("Missing required private-key in the config")]
    MissingSecrets,
    /// The same entity id was configured more than once.
    #[error("Entity `{}` is configured more than once", _0)]
    DuplicateEntity(String),
    /// The chain could not be queried for its height or its logs.
    #[error("Chain query failed: {}", _0)]
    ChainQuery(String),
    /// A chain call did not answer in time.
    #[error("{call} timed out after {timeout_ms}ms")]
    Timeout {
        /// The name of the call that timed out.
        call: &'static str,
        /// The timeout that elapsed.
        timeout_ms: u128,
    },
    /// The incoming request was rejected by the entity directory.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The data for the request could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// The fulfillment transaction could not be submitted.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// a backgorund task failed and stopped Abnormally.
    #[error("Task Stopped Apnormally")]
    TaskStoppedAbnormally,
}

/// Reasons a request is not eligible for resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No entity with this id is known.
    #[error("Entity `{entity_id}` not found in the directory")]
    NotFound {
        /// The requested entity id.
        entity_id: String,
    },
    /// The entity exists but the supplied name does not match.
    #[error(
        "Name mismatch for `{entity_id}`: expected `{expected}`, got `{found}`"
    )]
    NameMismatch {
        /// The requested entity id.
        entity_id: String,
        /// The display name stored in the directory.
        expected: String,
        /// The name supplied with the request.
        found: String,
    },
}

/// Why a single data source did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFailure {
    /// The source did not answer within the attempt timeout.
    Timeout,
    /// The connection failed before any response was received.
    Transport(String),
    /// The source answered with a non-2xx status code.
    Status(u16),
    /// The source answered with a body that is not a structured payload.
    MalformedBody(String),
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Status(code) => write!(f, "http status {code}"),
            Self::MalformedBody(e) => write!(f, "malformed body: {e}"),
        }
    }
}

/// A failed attempt against one data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    /// The name (usually the url) of the data source.
    pub source: String,
    /// What went wrong.
    pub failure: SourceFailure,
}

impl fmt::Display for SourceAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source, self.failure)
    }
}

/// Reasons the off-chain data of a request could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Every configured source failed.
    #[error(
        "All sources unavailable for `{locator}`: [{}]",
        join_attempts(.attempts)
    )]
    AllSourcesUnavailable {
        /// The data locator that was requested.
        locator: String,
        /// Every attempt, in priority order.
        attempts: Vec<SourceAttempt>,
    },
    /// A source answered, but the payload lacks a usable value.
    #[error("Invalid payload from {source_name}: {reason}")]
    InvalidPayload {
        /// The source that returned the payload.
        source_name: String,
        /// Why the payload was rejected.
        reason: String,
    },
}

fn join_attempts(attempts: &[SourceAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reasons a fulfillment transaction could not be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// The chain rejected the call while estimating gas, usually a revert.
    #[error("Gas estimation failed: {}", _0)]
    EstimationFailed(String),
    /// The transaction could not be sent or was not confirmed.
    #[error("Sending transaction failed: {}", _0)]
    SendFailed(String),
}

/// A type alias for the result for the oracle relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for HandlerError {
    fn from(value: Error) -> Self {
        let status = match value {
            Error::Validation(ValidationError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            Error::Validation(ValidationError::NameMismatch { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        HandlerError(status, value.to_string())
    }
}

/// Error type for HTTP handlers
#[derive(Debug)]
pub struct HandlerError(
    /// HTTP status code for response
    pub StatusCode,
    /// Response message
    pub String,
);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct ErrorBody {
            error: String,
        }
        let body = axum::Json(ErrorBody { error: self.1 });
        (self.0, body).into_response()
    }
}
