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

//! # Oracle Relayer Crate 🕸️
//!
//! A relayer answering the requests of a credit score oracle contract.
//!
//! ## Overview
//!
//! The oracle contract emits a `CreditScoreRequested` event every time a
//! consumer asks for the score of an entity. The relayer watches the chain
//! for these events, checks the requested entity against its directory,
//! fetches the entity data from a list of content gateways (the first one
//! that answers wins), and pushes the score back through
//! `fulfillCreditScore`.
//!
//! Alongside the relay loop, a small HTTP API exposes the relayer state,
//! the latest outcomes and a few operator tools.

/// A module for starting long-running tasks and the web server.
pub mod service;

/// A type alias for the result for the oracle relayer.
pub type Result<T> = oracle_relayer_utils::Result<T>;
