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
#![warn(missing_docs)]

//! # Oracle Relayer Configuration Module 🕸️
//!
//! A module for configuring the oracle relayer.
//!
//! ## Overview
//!
//! The relayer configuration module is responsible for configuring the relayer.
//! Possible configuration include:
//! * `port`: The port the HTTP API will listen on. Defaults to 3001
//! * `evm`: The chain, the oracle contract and the sending account.
//! * `resolver`: The ordered data gateways and the payload value field.
//! * `entities`: The entity directory requests are validated against.
//!   See [config/sepolia](../../config/sepolia) for an example.

/// CLI configuration
#[cfg(feature = "cli")]
pub mod cli;
/// Default values of the configuration.
pub mod defaults;
/// EVM configuration
pub mod evm;
/// Data resolver configuration
pub mod resolver;
/// Utils for processing configuration
pub mod utils;

use std::collections::HashSet;

use evm::EvmChainConfig;
use oracle_relayer_types::EntityRecord;
use resolver::ResolverConfig;
use serde::{Deserialize, Serialize};

/// OracleRelayerConfig is the configuration for the oracle relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OracleRelayerConfig {
    /// HTTP Server Port number
    ///
    /// default to 3001
    #[serde(default = "defaults::relayer_port", skip_serializing)]
    pub port: u16,
    /// The chain where the oracle contract lives.
    pub evm: EvmChainConfig,
    /// Where and how the off-chain data is fetched.
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// The entity directory.
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

impl OracleRelayerConfig {
    /// Makes sure that the config is valid, by going
    /// through the whole config and doing some basic checks.
    pub fn verify(&self) -> oracle_relayer_utils::Result<()> {
        // we always send transactions, so the key is never optional.
        if self.evm.private_key.is_none() {
            return Err(oracle_relayer_utils::Error::MissingSecrets);
        }
        if self.evm.polling_interval == 0 {
            return Err(oracle_relayer_utils::Error::Generic(
                "evm.polling-interval must be greater than zero",
            ));
        }
        if self.resolver.gateways.is_empty() {
            return Err(oracle_relayer_utils::Error::Generic(
                "resolver.gateways must contain at least one gateway",
            ));
        }
        let mut seen = HashSet::with_capacity(self.entities.len());
        for entity in &self.entities {
            if !seen.insert(entity.entity_id.as_str()) {
                return Err(oracle_relayer_utils::Error::DuplicateEntity(
                    entity.entity_id.clone(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    #[test]
    fn all_config_files_are_correct() {
        // Walks every directory under the workspace `config` dir and parses
        // the config file(s) inside it.
        let config_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config");
        let config_dirs =
            glob::glob(config_dir.join("*").to_str().unwrap())
                .expect("Failed to read config directory")
                .filter_map(|p| p.ok())
                .filter(|p| p.is_dir())
                .collect::<Vec<_>>();
        assert!(
            !config_dirs.is_empty(),
            "No config directories found in the config directory"
        );
        for config_subdir in config_dirs {
            // Load the example dot env file.
            let _ = dotenv::from_path(config_subdir.join(".env.example"));
            if let Err(e) = super::utils::load(&config_subdir) {
                panic!("Failed to parse config file in directory: {config_subdir:?} with error: {e}");
            }
        }
    }
}
