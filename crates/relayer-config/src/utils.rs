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
use config::{Config, File};
use std::path::{Path, PathBuf};

use super::*;

/// A helper function that will search for all config files in the given directory and return them as a vec
/// of the paths.
///
/// Supported file extensions are:
/// - `.toml`.
/// - `.json`.
pub fn search_config_files<P: AsRef<Path>>(
    base_dir: P,
) -> oracle_relayer_utils::Result<Vec<PathBuf>> {
    // A pattern that covers all toml or json files in the config directory and subdirectories.
    let toml_pattern = format!("{}/**/*.toml", base_dir.as_ref().display());
    let json_pattern = format!("{}/**/*.json", base_dir.as_ref().display());
    tracing::trace!(
        "Loading config files from {} and {}",
        toml_pattern,
        json_pattern
    );
    let toml_files = glob::glob(&toml_pattern)?;
    let json_files = glob::glob(&json_pattern)?;
    toml_files
        .chain(json_files)
        .map(|v| v.map_err(oracle_relayer_utils::Error::from))
        .collect()
}

/// Try to parse the [`OracleRelayerConfig`] from the given config file(s).
pub fn parse_from_files(
    files: &[PathBuf],
) -> oracle_relayer_utils::Result<OracleRelayerConfig> {
    let mut builder = Config::builder();
    for config_file in files {
        tracing::trace!("Loading config file: {}", config_file.display());
        let ext = config_file
            .extension()
            .map(|e| e.to_str().unwrap_or(""))
            .unwrap_or("");
        let format = match ext {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            _ => {
                tracing::warn!("Unknown file extension: {}", ext);
                continue;
            }
        };
        builder = builder
            .add_source(File::from(config_file.as_path()).format(format));
    }

    // also merge in the environment (with a prefix of ORACLE).
    let builder = builder
        .add_source(config::Environment::with_prefix("ORACLE").separator("_"));
    let cfg = builder.build()?;
    // and finally deserialize the config and post-process it
    let config: Result<
        OracleRelayerConfig,
        serde_path_to_error::Error<config::ConfigError>,
    > = serde_path_to_error::deserialize(cfg);
    match config {
        Ok(c) => postloading_process(c),
        Err(e) => {
            tracing::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Load the configuration files and
///
/// Returns `Ok(OracleRelayerConfig)` on success, or `Err(oracle_relayer_utils::Error)` on failure.
///
/// # Arguments
///
/// * `path` - The path to the configuration directory
///
/// # Example
///
/// ```no_run
/// use oracle_relayer_config::utils::load;
///
/// let path = "/path/to/config";
/// let config = load(path);
/// ```
///
/// it is the same as using the [`search_config_files`] and [`parse_from_files`] functions combined.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> oracle_relayer_utils::Result<OracleRelayerConfig> {
    parse_from_files(&search_config_files(path)?)
}

/// The postloading_process exists to validate configuration and standardize
/// the format of the configuration
pub fn postloading_process(
    mut config: OracleRelayerConfig,
) -> oracle_relayer_utils::Result<OracleRelayerConfig> {
    tracing::trace!("Checking configration sanity ...");
    config.verify()?;

    for gateway in &config.resolver.gateways {
        if !gateway.contains("{locator}") {
            tracing::warn!(
                "!!WARNING!!: gateway {} has no {{locator}} placeholder,
                the locator will be appended to it",
                gateway
            );
        }
    }
    // a trailing slash would make the appended locator a new path segment.
    config
        .resolver
        .gateways
        .iter_mut()
        .filter(|g| !g.contains("{locator}"))
        .for_each(|g| {
            if !g.ends_with('/') {
                g.push('/');
            }
            g.push_str("{locator}");
        });

    if config.entities.is_empty() {
        tracing::warn!(
            "!!WARNING!!: the entity directory is empty, every request will be rejected"
        );
    }

    tracing::trace!(
        "postloaded config: {}",
        serde_json::to_string_pretty(&config)?
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
        [evm]
        name = "sepolia"
        http-endpoint = "https://rpc.sepolia.org"
        chain-id = 11155111
        private-key = "0x8917174396171783496173419137618235192359106130478137647163400318"
        contract-address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
    "#;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("oracle-config-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("main.toml"), contents).unwrap();
        dir
    }

    #[test]
    fn defaults_are_applied() {
        let dir = write_config(
            "defaults",
            &format!(
                "{BASE}
                [[entities]]
                entity-id = \"user001\"
                display-name = \"John Doe\"
                data-locator = \"bafy1\"
                "
            ),
        );
        let config = load(&dir).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.evm.polling_interval, 5_000);
        assert_eq!(config.evm.chain_call_timeout, 30_000);
        assert_eq!(config.evm.start_block, None);
        assert_eq!(config.resolver.gateways.len(), 3);
        assert_eq!(config.resolver.attempt_timeout, 10_000);
        assert_eq!(config.resolver.value_field, "creditScore");
        assert_eq!(config.entities[0].display_name, "John Doe");
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let dir = write_config(
            "duplicates",
            &format!(
                "{BASE}
                [[entities]]
                entity-id = \"user001\"
                display-name = \"John Doe\"
                data-locator = \"bafy1\"
                [[entities]]
                entity-id = \"user001\"
                display-name = \"Jane Smith\"
                data-locator = \"bafy2\"
                "
            ),
        );
        let err = load(&dir).unwrap_err();
        assert!(matches!(
            err,
            oracle_relayer_utils::Error::DuplicateEntity(id) if id == "user001"
        ));
    }

    #[test]
    fn missing_private_key_is_rejected() {
        let dir = write_config(
            "no-key",
            r#"
            [evm]
            name = "sepolia"
            http-endpoint = "https://rpc.sepolia.org"
            chain-id = 11155111
            contract-address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            "#,
        );
        let err = load(&dir).unwrap_err();
        assert!(matches!(err, oracle_relayer_utils::Error::MissingSecrets));
    }

    #[test]
    fn gateways_without_placeholder_get_one() {
        let dir = write_config(
            "gateways",
            &format!(
                "{BASE}
                [resolver]
                gateways = [\"http://127.0.0.1:8080/ipfs\"]
                "
            ),
        );
        let config = load(&dir).unwrap();
        assert_eq!(
            config.resolver.gateways,
            vec![String::from("http://127.0.0.1:8080/ipfs/{locator}")]
        );
    }

    #[test]
    fn empty_gateways_and_zero_interval_fail_verification() {
        let dir = write_config("verify", BASE);
        let config = load(&dir).unwrap();

        let mut no_gateways = config.clone();
        no_gateways.resolver.gateways.clear();
        assert!(no_gateways.verify().is_err());

        let mut no_interval = config;
        no_interval.evm.polling_interval = 0;
        assert!(no_interval.verify().is_err());
    }
}
