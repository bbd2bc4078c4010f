// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the weather Modbus programs
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! - `modbus`: Modbus TCP link shared by the slave and the master
//! - `scheduler`: Control loop quantum
//! - `slave`: Weather data file and task intervals of the slave
//! - `master`: Task intervals of the master
//! - `logging`: Timestamp offset of log lines
//!
//! ## Usage
//!
//! ```no_run
//! use rust_weather_modbus::config::Config;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file("config.yaml").unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("0.0.0.0".to_string()), // Modbus address
//!     Some(502),                   // Modbus port
//!     None,                        // Weather data file
//!     Some(true),                  // Simulated weather
//! );
//!
//! println!("Modbus port: {}", config.modbus.port);
//! ```

pub mod modbus;
pub mod roles;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use modbus::ModbusConfig;
pub use roles::{LoggingConfig, MasterConfig, SchedulerConfig, SlaveConfig};
pub use utils::{is_valid_ip_address, output_config_schema, validate_specific_rules};

/// JSON schema the YAML configuration is validated against.
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure.
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, allowing for minimal configuration files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Modbus TCP link settings.
    #[serde(default)]
    pub modbus: ModbusConfig,

    /// Control loop settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Slave role settings.
    #[serde(default)]
    pub slave: SlaveConfig,

    /// Master role settings.
    #[serde(default)]
    pub master: MasterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. A file that
    /// fails schema validation, deserialization or the additional rules of
    /// [`validate_specific_rules`] is rejected, and a `<name>.sample.yaml` file
    /// holding the defaults is written next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!(
                "Configuration validation error before deserialization: {}",
                error
            );
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Check the configuration against the rules the schema cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_specific_rules(self)
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only explicitly provided values override the loaded configuration.
    ///
    /// # Parameters
    ///
    /// * `modbus_address` - Address of the Modbus server
    /// * `modbus_port` - TCP port of the Modbus server
    /// * `data_file` - JSON weather data file read by the slave
    /// * `simulate` - Use simulated weather samples on the slave
    pub fn apply_args(
        &mut self,
        modbus_address: Option<String>,
        modbus_port: Option<u16>,
        data_file: Option<PathBuf>,
        simulate: Option<bool>,
    ) {
        if let Some(address) = modbus_address {
            debug!("Overriding Modbus address from command line: {}", address);
            self.modbus.address = address;
        }
        if let Some(port) = modbus_port {
            debug!("Overriding Modbus port from command line: {}", port);
            self.modbus.port = port;
        }
        if let Some(file) = data_file {
            debug!("Overriding weather data file from command line: {:?}", file);
            self.slave.data_file = file.to_string_lossy().to_string();
        }
        if let Some(simulate) = simulate {
            debug!("Overriding simulated weather from command line: {}", simulate);
            self.slave.simulate = simulate;
        }
    }
}
